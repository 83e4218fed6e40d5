//! HTML rendering.
//!
//! Templates are compiled into the binary and rendered with minijinja.
//! Handlers never format raw XML into pages; they pass small
//! serializable view structs.

use minijinja::{Environment, Value};

/// Template environment shared by all handlers.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../../templates/base.html"))?;
        env.add_template("index.html", include_str!("../../templates/index.html"))?;
        env.add_template("home.html", include_str!("../../templates/home.html"))?;
        env.add_template("reports.html", include_str!("../../templates/reports.html"))?;
        env.add_template("tickets.html", include_str!("../../templates/tickets.html"))?;
        env.add_template("ticket.html", include_str!("../../templates/ticket.html"))?;
        env.add_template("schedules.html", include_str!("../../templates/schedules.html"))?;
        env.add_template(
            "schedule_detail.html",
            include_str!("../../templates/schedule_detail.html"),
        )?;
        env.add_template(
            "schedule_log.html",
            include_str!("../../templates/schedule_log.html"),
        )?;
        Ok(Self { env })
    }

    pub fn render(&self, name: &str, ctx: Value) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}
