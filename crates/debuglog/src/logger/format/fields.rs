use std::{collections::BTreeMap, fmt};

use tracing::{
    Subscriber,
    field::{Field, Visit},
    span,
};
use tracing_subscriber::{
    layer::{Context, Layer},
    registry::LookupSpan,
};

use crate::logger::object::order::{MSG_KEY, RESERVED_KEYS};

/// Name `tracing` gives the formatted message of an event.
const MESSAGE_FIELD: &str = "message";

/// Prefix for user fields that collide with a built-in key.
const CLASH_PREFIX: &str = "fields.";

/// Fields of one record keyed by their rendered name.
pub(crate) type FieldMap = BTreeMap<String, String>;

/// Collects field values as plain strings.
///
/// The `message` field becomes `msg`; user fields named like a built-in
/// key are stored as `fields.<key>`.
pub(crate) struct FieldCollector<'a>(pub(crate) &'a mut FieldMap);

impl FieldCollector<'_> {
    fn insert(&mut self, field: &Field, value: String) {
        let name = field.name();
        let key = if name == MESSAGE_FIELD {
            MSG_KEY.to_string()
        } else if RESERVED_KEYS.contains(&name) {
            format!("{CLASH_PREFIX}{name}")
        } else {
            name.to_string()
        };
        self.0.insert(key, value);
    }
}

impl Visit for FieldCollector<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }
}

/// Span fields stored in the span's extensions.
#[derive(Debug, Default)]
pub(crate) struct SpanFields(pub(crate) FieldMap);

/// Records span fields so the text formatter can render them as key/value pairs.
pub(crate) struct SpanFieldsLayer;

impl<S> Layer<S> for SpanFieldsLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = SpanFields::default();
        attrs.record(&mut FieldCollector(&mut fields.0));
        span.extensions_mut().insert(fields);
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            values.record(&mut FieldCollector(&mut fields.0));
        }
    }
}
