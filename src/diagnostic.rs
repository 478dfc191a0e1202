//! Source-anchored error reports, rendered with ariadne.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::span::Span;

/// A rendered-on-demand compile error pointing into DSL text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

type Spanned<'a> = (&'a str, Range<usize>);

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    fn build<'a>(&self, filename: &'a str, source_len: usize, color: bool) -> Report<'a, Spanned<'a>> {
        // Clamp so a stale span never points past the text.
        let end = (self.span.end as usize).min(source_len);
        let start = (self.span.start as usize).min(end);

        let mut report = Report::build(ReportKind::Error, filename, start)
            .with_config(Config::default().with_color(color))
            .with_message(&self.message)
            .with_label(
                Label::new((filename, start..end))
                    .with_message("here")
                    .with_color(Color::Red),
            );
        for note in &self.notes {
            report = report.with_note(note);
        }
        if let Some(help) = &self.help {
            report = report.with_help(help);
        }
        report.finish()
    }

    /// Print to stderr with colour.
    pub fn render(&self, filename: &str, source: &str) {
        let report = self.build(filename, source.len(), true);
        if let Err(e) = report.eprint((filename, Source::from(source))) {
            eprintln!("error: {} ({})", self.message, e);
        }
    }

    /// Plain text, for tests and log lines.
    pub fn render_to_string(&self, filename: &str, source: &str) -> String {
        let mut buf = Vec::new();
        let report = self.build(filename, source.len(), false);
        match report.write((filename, Source::from(source)), &mut buf) {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.message.clone(),
        }
    }
}
