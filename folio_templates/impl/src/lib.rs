use std::sync::Arc;

use anyhow::Context;
use folio_templates_contracts::{
    RenderedTemplate, Template, TemplateService, BASE_TEMPLATE, TEMPLATES,
};
use folio_utils::trace_instrument;
use tera::Tera;

#[derive(Debug, Clone)]
pub struct TemplateServiceImpl {
    tera: Arc<Tera>,
}

impl TemplateServiceImpl {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_template("base.html", BASE_TEMPLATE)
            .context("Failed to load base template")?;

        for &(name, html, text) in TEMPLATES {
            tera.add_raw_templates([(format!("{name}.html"), html), (format!("{name}.txt"), text)])
                .with_context(|| format!("Failed to load template {name}"))?;
        }

        Ok(Self { tera: tera.into() })
    }
}

impl TemplateService for TemplateServiceImpl {
    #[trace_instrument(skip(self, template), fields(template = T::NAME))]
    fn render<T: Template + 'static>(&self, template: &T) -> anyhow::Result<RenderedTemplate> {
        let context = tera::Context::from_serialize(template)?;
        let render = |suffix: &str| {
            self.tera
                .render(&format!("{}.{suffix}", T::NAME), &context)
                .with_context(|| format!("Failed to render {} ({suffix})", T::NAME))
        };

        Ok(RenderedTemplate {
            html: render("html")?,
            text: render("txt")?,
        })
    }
}
