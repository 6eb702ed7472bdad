//! Output formatting

use std::io::Write;

use anyhow::Context;
use serde::Serialize;

/// JSON writer for stdout.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pretty: bool,
}

impl Output {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn render<T: Serialize>(&self, data: &T) -> anyhow::Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(data)
        } else {
            serde_json::to_string(data)
        };
        text.context("serializing output")
    }

    pub fn print<T: Serialize>(&self, data: &T) -> anyhow::Result<()> {
        let text = self.render(data)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}").context("writing to stdout")
    }
}
