//! `tracing` output for hosts without a stderr. Each formatted event goes to a
//! sink as one plain line tagged with its level; the browser shell points the
//! sink at `console`.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

pub type LineSink = fn(Level, &str);

#[derive(Clone, Copy)]
pub struct LineMakeWriter {
    sink: LineSink,
}

impl LineMakeWriter {
    pub fn new(sink: LineSink) -> Self {
        Self { sink }
    }

    fn writer(&self, level: Level) -> LineWriter {
        LineWriter {
            level,
            buf: Vec::new(),
            sink: self.sink,
        }
    }
}

/// Buffers one event and hands it to the sink when dropped.
pub struct LineWriter {
    level: Level,
    buf: Vec<u8>,
    sink: LineSink,
}

impl io::Write for LineWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        (self.sink)(self.level, line.trim_end());
    }
}

impl<'a> MakeWriter<'a> for LineMakeWriter {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.writer(*meta.level())
    }
}

/// Plain-text subscriber (no timestamps, no ANSI) for events at `max_level`
/// and more severe.
pub fn line_subscriber(sink: LineSink, max_level: Level) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_writer(LineMakeWriter::new(sink))
        .with_max_level(max_level)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .finish()
}
