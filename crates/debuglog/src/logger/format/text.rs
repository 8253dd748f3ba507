use std::fmt::{self, Write as _};

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{FmtContext, FormatEvent, FormatFields, format::Writer},
    registry::LookupSpan,
};

use crate::logger::{
    format::fields::{FieldCollector, FieldMap, SpanFields},
    object::{
        FieldOrder, LoggerTimeZone, clock,
        order::{FUNC_KEY, LEVEL_KEY, MSG_KEY, TIME_KEY},
    },
};

/// Plain-text record format: one line of `key="value"` pairs.
///
/// ```text
/// time="2024-03-07T09:05:03+09:00" level="info" func="worker:42" job="sync" msg="done"
/// ```
///
/// Values are always quoted and escaped, never colored. Keys follow the
/// configured [`FieldOrder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormat {
    order: FieldOrder,
    tz: LoggerTimeZone,
}

impl TextFormat {
    pub fn new(order: FieldOrder, tz: LoggerTimeZone) -> Self {
        Self { order, tz }
    }
}

impl<S, N> FormatEvent<S, N> for TextFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = FieldMap::new();

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                if let Some(span_fields) = span.extensions().get::<SpanFields>() {
                    fields.extend(
                        span_fields
                            .0
                            .iter()
                            .filter(|(k, _)| k.as_str() != MSG_KEY)
                            .map(|(k, v)| (k.clone(), v.clone())),
                    );
                }
            }
        }

        event.record(&mut FieldCollector(&mut fields));
        fields.entry(MSG_KEY.to_string()).or_default();

        let meta = event.metadata();
        fields.insert(TIME_KEY.to_string(), clock::rfc3339(clock::now(self.tz)));
        fields.insert(LEVEL_KEY.to_string(), level_name(meta.level()).to_string());
        fields.insert(
            FUNC_KEY.to_string(),
            caller(meta.module_path().unwrap_or(meta.target()), meta.line()),
        );

        let mut pairs: Vec<(String, String)> = fields.into_iter().collect();
        self.order.sort(&mut pairs);

        for (i, (key, value)) in pairs.iter().enumerate() {
            if i > 0 {
                writer.write_char(' ')?;
            }
            write!(writer, "{key}={value:?}")?;
        }
        writeln!(writer)
    }
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warning",
        Level::ERROR => "error",
    }
}

/// `<last path segment>:<line>`, e.g. `worker:42` for `my_app::jobs::worker`.
fn caller(module: &str, line: Option<u32>) -> String {
    let name = module.rsplit("::").next().unwrap_or(module);
    match line {
        Some(line) => format!("{name}:{line}"),
        None => name.to_string(),
    }
}
