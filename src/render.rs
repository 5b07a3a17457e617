//! Output rendering for streamed answers.
//!
//! The stream decoder never writes to stdout itself.  It hands every text fragment to a
//! [`Renderer`], so the same decoding path serves the terminal, tests that collect
//! fragments, and the silent fan-out workers.

use std::io::{self, Stdout, Write};

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for headings).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling for a terminal
/// - Plain text without styling (for piping/redirecting)
/// - Silent collection in tests and background workers
pub trait Renderer: Send {
    /// Print a chunk of response text.
    ///
    /// This is called incrementally as fragments arrive from the stream.
    fn print_text(&mut self, text: &str);

    /// Print a heading, such as the name of the model that answered.
    fn print_heading(&mut self, heading: &str) {
        self.print_info(heading);
    }

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a streamed response is complete.
    fn finish_response(&mut self);

    /// Called when the request is cancelled by the user.
    fn print_interrupted(&mut self) {}
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    mid_line: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            mid_line: false,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn end_line(&mut self) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.mid_line = !text.ends_with('\n');
        self.flush();
    }

    fn print_heading(&mut self, heading: &str) {
        self.end_line();
        if self.use_color {
            println!("{ANSI_BOLD}{heading}{ANSI_RESET}");
        } else {
            println!("{heading}");
        }
    }

    fn print_error(&mut self, error: &str) {
        self.end_line();
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.end_line();
        if self.use_color {
            println!("{ANSI_DIM}{info}{ANSI_RESET}");
        } else {
            println!("{info}");
        }
    }

    fn finish_response(&mut self) {
        println!();
        self.mid_line = false;
        self.flush();
    }

    fn print_interrupted(&mut self) {
        self.end_line();
        println!("[interrupted]");
        self.flush();
    }
}

/// A renderer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentRenderer;

impl Renderer for SilentRenderer {
    fn print_text(&mut self, _: &str) {}

    fn print_error(&mut self, _: &str) {}

    fn print_info(&mut self, _: &str) {}

    fn finish_response(&mut self) {}
}

/// A renderer that records every fragment it is given.
#[derive(Debug, Default, Clone)]
pub struct CollectingRenderer {
    /// Text fragments, in the order they were printed.
    pub fragments: Vec<String>,
    /// Informational and heading lines.
    pub info: Vec<String>,
    /// Error lines.
    pub errors: Vec<String>,
    /// Number of completed responses.
    pub finished: usize,
}

impl CollectingRenderer {
    /// The concatenation of all text fragments.
    pub fn text(&self) -> String {
        self.fragments.concat()
    }
}

impl Renderer for CollectingRenderer {
    fn print_text(&mut self, text: &str) {
        self.fragments.push(text.to_string());
    }

    fn print_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }

    fn print_info(&mut self, info: &str) {
        self.info.push(info.to_string());
    }

    fn finish_response(&mut self) {
        self.finished += 1;
    }
}
