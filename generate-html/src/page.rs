use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use shared::{FieldKind, FormField, FunctionDescriptor};
use tracing::{info, warn};

use crate::template::{Slot, Template, TemplateContext};

const INDEX_FILE: &str = "index.html";

fn text_area(field: &FormField) -> String {
    format!(
        "\n\t<label for=\"{0}\">{1}</label><br>\n\t<textarea id=\"{0}\" name=\"{0}\"></textarea><br>\n",
        field.name, field.label
    )
}

fn drop_down(field: &FormField, options: &[String]) -> String {
    let options: Vec<String> = options
        .iter()
        .map(|option| format!("<option value=\"{option}\">{option}</option>"))
        .collect();
    format!(
        "\n<label for=\"{0}\">{1}</label>\n<select id=\"{0}\">\n{2}\n</select>\n",
        field.name,
        field.label,
        options.join("\n")
    )
}

fn field_html(field: &FormField) -> String {
    match &field.kind {
        FieldKind::TextArea => text_area(field),
        FieldKind::DropDown { drop_down_options } => drop_down(field, drop_down_options),
    }
}

/// The submit form holding one input per descriptor field.
pub fn full_form(descriptor: &FunctionDescriptor) -> String {
    let fields: Vec<String> = descriptor.form_fields.iter().map(field_html).collect();
    format!(
        "\n<form id=\"textForm\">\n    {}\n    <button type=\"submit\">Submit</button>\n</form>\n",
        fields.join("\n")
    )
}

/// Body of a JavaScript object literal reading every field from the DOM.
pub fn form_data(descriptor: &FunctionDescriptor) -> String {
    descriptor
        .form_fields
        .iter()
        .map(|field| format!("{0}: document.getElementById('{0}').value", field.name))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn page_list<'a>(function_names: impl IntoIterator<Item = &'a str>) -> String {
    let items: Vec<String> = function_names
        .into_iter()
        .map(|name| format!("\t<li><a href=\"/{name}.html\">{name}</a></li>"))
        .collect();
    format!("\n<ul>\n{}\n</ul>\n", items.join("\n"))
}

pub struct PageContext<'a> {
    function_name: &'a str,
    full_form: String,
    form_data: String,
    domain_name: &'a str,
}

impl<'a> PageContext<'a> {
    pub fn new(function_name: &'a str, descriptor: &FunctionDescriptor, domain_name: &'a str) -> Self {
        PageContext {
            function_name,
            full_form: full_form(descriptor),
            form_data: form_data(descriptor),
            domain_name,
        }
    }
}

impl TemplateContext for PageContext<'_> {
    fn value(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::FunctionName => Some(self.function_name),
            Slot::FullForm => Some(self.full_form.as_str()),
            Slot::FormData => Some(self.form_data.as_str()),
            Slot::DomainName => Some(self.domain_name),
            Slot::PageList => None,
        }
    }
}

pub struct IndexContext {
    page_list: String,
}

impl TemplateContext for IndexContext {
    fn value(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::PageList => Some(self.page_list.as_str()),
            _ => None,
        }
    }
}

pub struct Templates {
    pub main: Template,
    pub index: Template,
}

impl Templates {
    /// Reads `main_template.html` and `index_template.html` from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let templates = Templates {
            main: Template::load(dir.join("main_template.html"))?,
            index: Template::load(dir.join("index_template.html"))?,
        };
        if !templates.main.slots().any(|slot| slot == Slot::FullForm) {
            warn!(dir = %dir.display(), "main template has no FULL_FORM marker");
        }
        if !templates.index.slots().any(|slot| slot == Slot::PageList) {
            warn!(dir = %dir.display(), "index template has no PAGE_LIST marker");
        }
        Ok(templates)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub function_name: String,
    pub html: String,
}

impl RenderedPage {
    pub fn file_name(&self) -> String {
        format!("{}.html", self.function_name)
    }
}

/// Every page produced by one generator run.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub pages: Vec<RenderedPage>,
    pub index: String,
}

impl Site {
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|page| page.function_name.as_str())
    }
}

pub fn generate_site(
    descriptors: &BTreeMap<String, FunctionDescriptor>,
    templates: &Templates,
    domain_name: &str,
) -> anyhow::Result<Site> {
    let mut pages = Vec::with_capacity(descriptors.len());
    for (function_name, descriptor) in descriptors {
        // index.html is reserved for the page list.
        if format!("{function_name}.html") == INDEX_FILE {
            bail!("function name `{function_name}` clashes with the index page");
        }
        let context = PageContext::new(function_name, descriptor, domain_name);
        pages.push(RenderedPage {
            function_name: function_name.clone(),
            html: templates.main.render(&context),
        });
    }

    let site_index = IndexContext {
        page_list: page_list(pages.iter().map(|page| page.function_name.as_str())),
    };
    let index = templates.index.render(&site_index);

    Ok(Site { pages, index })
}

pub fn write_site(site: &Site, output: impl AsRef<Path>) -> anyhow::Result<()> {
    let output = output.as_ref();
    fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;

    for page in &site.pages {
        let path = output.join(page.file_name());
        fs::write(&path, &page.html).with_context(|| format!("failed to write {}", path.display()))?;
        info!(function = %page.function_name, path = %path.display(), "wrote page");
    }

    let path = output.join(INDEX_FILE);
    fs::write(&path, &site.index).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), pages = site.pages.len(), "wrote index");
    Ok(())
}
