use std::fs;
use std::path::Path;

use anyhow::Context;

/// A named hole in a page template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    FunctionName,
    FullForm,
    FormData,
    DomainName,
    PageList,
}

impl Slot {
    pub const ALL: [Slot; 5] = [
        Slot::FunctionName,
        Slot::FullForm,
        Slot::FormData,
        Slot::DomainName,
        Slot::PageList,
    ];

    /// Marker text that stands for the slot in a template file.
    pub fn token(self) -> &'static str {
        match self {
            Slot::FunctionName => "FUNCTION_NAME",
            Slot::FullForm => "FULL_FORM",
            Slot::FormData => "FORM_DATA",
            Slot::DomainName => "DOMAIN_NAME",
            Slot::PageList => "PAGE_LIST",
        }
    }
}

/// Supplies the value for each slot it knows about.
pub trait TemplateContext {
    fn value(&self, slot: Slot) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Slot(Slot),
}

/// Template text split into literal runs and slots once, at parse time.
///
/// Rendering only ever looks at the parsed segments, so markers that show up
/// inside substituted values are left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = source;
        loop {
            let next = Slot::ALL
                .iter()
                .filter_map(|slot| rest.find(slot.token()).map(|at| (at, *slot)))
                .min_by_key(|(at, _)| *at);

            let Some((at, slot)) = next else {
                if !rest.is_empty() {
                    segments.push(Segment::Text(rest.to_string()));
                }
                break;
            };
            if at > 0 {
                segments.push(Segment::Text(rest[..at].to_string()));
            }
            segments.push(Segment::Slot(slot));
            rest = &rest[at + slot.token().len()..];
        }
        Template { segments }
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read template {}", path.display()))?;
        Ok(Self::parse(&source))
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Slot(slot) => Some(*slot),
            Segment::Text(_) => None,
        })
    }

    /// Slots the context has no value for are written back as their marker.
    pub fn render(&self, context: &impl TemplateContext) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(slot) => out.push_str(context.value(*slot).unwrap_or(slot.token())),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl TemplateContext for Fixed {
        fn value(&self, slot: Slot) -> Option<&str> {
            (slot == Slot::FunctionName).then_some(self.0)
        }
    }

    #[test]
    fn finds_every_marker_in_order() {
        let template = Template::parse("<h1>FUNCTION_NAME</h1>FULL_FORM x FORM_DATA FUNCTION_NAME");
        let slots: Vec<_> = template.slots().collect();
        assert_eq!(
            slots,
            [Slot::FunctionName, Slot::FullForm, Slot::FormData, Slot::FunctionName]
        );
    }

    #[test]
    fn values_are_not_rescanned() {
        let template = Template::parse("[FUNCTION_NAME]");
        assert_eq!(template.render(&Fixed("DOMAIN_NAME")), "[DOMAIN_NAME]");
    }

    #[test]
    fn unknown_slots_keep_their_marker() {
        let template = Template::parse("a PAGE_LIST b FUNCTION_NAME");
        assert_eq!(template.render(&Fixed("fn")), "a PAGE_LIST b fn");
    }

    #[test]
    fn text_without_markers_is_unchanged() {
        let template = Template::parse("plain <b>html</b>");
        assert_eq!(template.slots().count(), 0);
        assert_eq!(template.render(&Fixed("x")), "plain <b>html</b>");
    }
}
