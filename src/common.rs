// Licensed under the Apache-2.0 license

//! Logging plumbing shared by the drivers in this crate.
//!
//! Drivers take a `Logger` type parameter that defaults to [`NoOpLogger`], so a
//! build without a console pays nothing for the log calls.

use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Error => "error",
        }
    }
}

pub trait Logger {
    fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>);

    fn debug(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn error(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&mut self, _level: LogLevel, _args: fmt::Arguments<'_>) {}
}

/// Logger that writes `[level] message` lines to an `embedded_io` sink, usually a UART.
///
/// Messages below `min_level` are dropped. Write errors are ignored.
pub struct IoLogger<W: embedded_io::Write> {
    writer: W,
    min_level: LogLevel,
}

impl<W: embedded_io::Write> IoLogger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            min_level: LogLevel::Debug,
        }
    }

    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: embedded_io::Write> Logger for IoLogger<W> {
    fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        if level < self.min_level {
            return;
        }
        let _ = write!(self.writer, "[{}] ", level.tag());
        let _ = self.writer.write_fmt(args);
        let _ = self.writer.write_all(b"\r\n");
    }
}

impl<L: Logger + ?Sized> Logger for &mut L {
    fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        (**self).log(level, args);
    }
}
