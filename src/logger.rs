//! Buildpack console output
//!
//! Buildpack output is read by humans in a build log, so it is leveled into a
//! title banner, unindented headers, indented body lines and optional debug
//! lines. Styling is decided when the logger is built rather than globally.

use console::{style, StyledObject};
use std::env;
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

const BODY_INDENT: &str = "  ";

/// Cloneable handle over a shared output sink
#[derive(Clone)]
pub struct Logger {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
    color: bool,
    debug: bool,
}

impl Logger {
    /// Log to stdout, with debug output controlled by `$BP_DEBUG` / `$BP_LOG_LEVEL`
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout())).with_debug(debug_enabled())
    }

    /// Log to an arbitrary writer without color or debug output
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
            color: false,
            debug: false,
        }
    }

    /// Discard all output
    pub fn sink() -> Self {
        Self::new(Box::new(io::sink()))
    }

    /// Enable or disable ANSI styling
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Enable or disable the debug sink
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.debug
    }

    /// Buildpack banner, e.g. `Example JRE 1.2.3`
    pub fn title(&self, name: &str, version: &str, homepage: Option<&str>) {
        let line = format!("{} {}", self.bold(name), version);
        self.write_line("");
        self.write_line(&line);
        if let Some(homepage) = homepage {
            self.write_line(&format!("{}{}", BODY_INDENT, self.dim(homepage)));
        }
    }

    /// Unindented line
    pub fn header(&self, message: impl Display) {
        self.write_line(&message.to_string());
    }

    /// Indented line; every line of a multi-line message is indented
    pub fn body(&self, message: impl Display) {
        for line in message.to_string().lines() {
            self.write_line(&format!("{}{}", BODY_INDENT, line));
        }
    }

    /// Indented line shown only when debug output is enabled
    pub fn debug(&self, message: impl Display) {
        if !self.debug {
            return;
        }
        for line in message.to_string().lines() {
            self.write_line(&format!("{}{}", BODY_INDENT, self.dim(line)));
        }
    }

    /// Warning header, e.g. `Warning: dependency has no checksum`
    pub fn warning(&self, message: impl Display) {
        self.header(format!("{} {}", self.yellow("Warning:"), message));
    }

    pub fn bold<D>(&self, value: D) -> StyledObject<D> {
        style(value).force_styling(self.color).bold()
    }

    pub fn blue<D>(&self, value: D) -> StyledObject<D> {
        style(value).force_styling(self.color).blue()
    }

    pub fn green<D>(&self, value: D) -> StyledObject<D> {
        style(value).force_styling(self.color).green()
    }

    pub fn yellow<D>(&self, value: D) -> StyledObject<D> {
        style(value).force_styling(self.color).yellow().bold()
    }

    pub fn dim<D>(&self, value: D) -> StyledObject<D> {
        style(value).force_styling(self.color).dim()
    }

    fn write_line(&self, line: &str) {
        // A poisoned or broken sink must never fail a build
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("color", &self.color)
            .field("debug", &self.debug)
            .finish()
    }
}

/// Whether `$BP_DEBUG` is set or `$BP_LOG_LEVEL` is `DEBUG`
pub fn debug_enabled() -> bool {
    env::var_os("BP_DEBUG").is_some()
        || env::var("BP_LOG_LEVEL")
            .map(|level| level.eq_ignore_ascii_case("debug"))
            .unwrap_or(false)
}

/// In-memory sink, used by tests to inspect output
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger writing into this capture
    pub fn logger(&self) -> Logger {
        Logger::new(Box::new(self.clone()))
    }

    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut inner) => inner.write(buf),
            Err(_) => Err(io::Error::other("capture buffer poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
