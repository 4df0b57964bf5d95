/**
 * Presentation logic.  The dispatch core only ever talks to a
 * `PresentationSink`; what a sink does with the tables and notices it is handed
 * is its own business.  We provide an in-memory sink (used for JSON output and
 * tests) and an HTML sink that emits a static document.
 **/
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// A single table row.  Header rows are emitted as `<th>` cells and data rows
/// as `<td>` cells.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub header: bool,
    pub cells: Vec<String>,
}

fn row<I, T>(header: bool, cells: I) -> Row
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    Row {
        header,
        cells: cells.into_iter().map(|c| c.to_string()).collect(),
    }
}

pub fn rowth<I, T>(cells: I) -> Row
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    row(true, cells)
}

pub fn rowtd<I, T>(cells: I) -> Row
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    row(false, cells)
}

static ID_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique token for keying dynamically created containers.  The
/// counter starts at 1 and is never reset.
pub fn uid() -> String {
    format!("id{}", ID_SERIAL.fetch_add(1, Ordering::Relaxed))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Table {
    pub header: Row,
    pub rows: Vec<Row>,
}

/// A table that has been handed to a sink and given a container.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tab {
    pub id: String,
    pub name: String,
    pub table: Table,
}

/// User-visible notifications.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Notice {
    /// The server itself reported an error; an expected condition.
    ServerError(String),
    /// The server sent a response we don't understand.
    ProtocolMismatch(String),
    /// A response could not be processed.
    Failure(String),
    /// The request channel failed and the request chain has stopped.
    Fatal(String),
}

impl Notice {
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::ServerError(_) => "server-error",
            Notice::ProtocolMismatch(_) => "protocol-mismatch",
            Notice::Failure(_) => "failure",
            Notice::Fatal(_) => "fatal",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::ServerError(msg) => format!("Got an error: {}", msg),
            Notice::ProtocolMismatch(msg) => format!("Unrecognized response: {}", msg),
            Notice::Failure(msg) => format!("Response processing failed: {}", msg),
            Notice::Fatal(msg) => format!("Internal error, response processing failed: {}", msg),
        }
    }
}

pub trait PresentationSink {
    /// Request a new named container holding `table`, returning its id.
    fn add_tab(&mut self, name: &str, table: Table) -> String;

    fn notify(&mut self, notice: Notice);
}

/// Sink that just remembers everything in arrival order.
#[derive(Debug, Default, Serialize)]
pub struct MemorySink {
    pub tabs: Vec<Tab>,
    pub notices: Vec<Notice>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresentationSink for MemorySink {
    fn add_tab(&mut self, name: &str, table: Table) -> String {
        let id = uid();
        self.tabs.push(Tab {
            id: id.clone(),
            name: name.to_string(),
            table,
        });
        id
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// `generate_formatted` input type that allows for hierarchical indentation and
/// not having to call to_string() on everything.
#[derive(Clone, Debug)]
pub enum F {
    /// Indents its children by one 2-spaced level.
    /// Use like `F::Indent(vec![...])`.
    Indent(Vec<F>),
    /// Doesn't indent its children.
    /// Use like `F::Seq(vec![...])`.
    Seq(Vec<F>),
    /// For when you don't have a 'static lifetime string literal that's part of
    /// the program source.  Frequently this is the result of a `format!` call.
    T(String),
    /// For string literals in the program.
    S(&'static str),
}

pub fn generate_formatted(
    writer: &mut dyn Write,
    formatted: &F,
    indent: u32,
) -> Result<(), &'static str> {
    match *formatted {
        F::Indent(ref seq) => {
            for f in seq {
                generate_formatted(writer, f, indent + 1)?;
            }
            Ok(())
        }
        F::Seq(ref seq) => {
            for f in seq {
                generate_formatted(writer, f, indent)?;
            }
            Ok(())
        }
        F::T(ref text) => write_line(writer, text, indent),
        F::S(text) => write_line(writer, text, indent),
    }
}

fn write_line(writer: &mut dyn Write, text: &str, indent: u32) -> Result<(), &'static str> {
    for _ in 0..indent {
        write!(writer, "  ").map_err(|_| "Write err")?;
    }
    writeln!(writer, "{}", text).map_err(|_| "Write err")
}

pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn format_row(row: &Row) -> F {
    let tag = if row.header { "th" } else { "td" };
    let cells: String = row
        .cells
        .iter()
        .map(|cell| format!("<{0}>{1}</{0}>", tag, escape_html(cell)))
        .collect();
    F::T(format!("<tr>{}</tr>", cells))
}

pub fn format_tab(id: &str, name: &str, table: &Table) -> F {
    let mut rows = vec![format_row(&table.header)];
    rows.extend(table.rows.iter().map(format_row));

    F::Seq(vec![
        F::T(format!(r#"<div class="tab" id="{}">"#, escape_html(id))),
        F::Indent(vec![
            F::T(format!("<h2>{}</h2>", escape_html(name))),
            F::S("<table>"),
            F::Indent(rows),
            F::S("</table>"),
        ]),
        F::S("</div>"),
    ])
}

pub fn format_notice(notice: &Notice) -> F {
    F::T(format!(
        r#"<div class="notice notice-{}">{}</div>"#,
        notice.kind(),
        escape_html(&notice.message())
    ))
}

/// Sink that accumulates HTML fragments for later output as a standalone
/// document via `write_document`.
#[derive(Debug, Default)]
pub struct HtmlSink {
    body: Vec<F>,
}

impl HtmlSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_document(&self, writer: &mut dyn Write, title: &str) -> Result<(), &'static str> {
        let f = F::Seq(vec![
            F::S("<!DOCTYPE html>"),
            F::S(r#"<html lang="en-US">"#),
            F::S("<head>"),
            F::Indent(vec![
                F::S(r#"<meta charset="utf-8" />"#),
                F::T(format!("<title>{}</title>", escape_html(title))),
            ]),
            F::S("</head>"),
            F::S("<body>"),
            F::Indent(self.body.clone()),
            F::S("</body>"),
            F::S("</html>"),
        ]);

        generate_formatted(writer, &f, 0)
    }
}

impl PresentationSink for HtmlSink {
    fn add_tab(&mut self, name: &str, table: Table) -> String {
        let id = uid();
        self.body.push(format_tab(&id, name, &table));
        id
    }

    fn notify(&mut self, notice: Notice) {
        self.body.push(format_notice(&notice));
    }
}
