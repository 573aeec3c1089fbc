//! Human and machine readable rendering of an evaluation run

use crossterm::style::{style, Color, Stylize};
use itertools::Itertools;
use std::fmt::Display;
use std::io::{self, Write};

use crate::runner::{EvaluationRun, StrategyReport};
use crate::types::Direction;

/// Renders an evaluation run
pub trait Reporter {
    fn report(&self, run: &EvaluationRun, out: &mut dyn Write) -> io::Result<()>;
}

/// Indented plain-text report, optionally colored
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    pub color: bool,
    /// Skip strategies that are not active on the current weekday
    pub active_weekdays_only: bool,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        ConsoleReporter {
            color: true,
            active_weekdays_only: false,
        }
    }
}

impl ConsoleReporter {
    fn paint<D: Display>(&self, value: D, color: Color) -> String {
        if self.color {
            style(value).with(color).to_string()
        } else {
            value.to_string()
        }
    }

    fn flag(&self, value: bool) -> String {
        let color = if value { Color::Green } else { Color::Red };
        self.paint(value, color)
    }

    fn side(&self, direction: Direction) -> String {
        match direction {
            Direction::Up => self.paint(direction, Color::Green),
            Direction::Down => self.paint(direction, Color::Red),
        }
    }

    fn write_strategy(
        &self,
        run: &EvaluationRun,
        report: &StrategyReport,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let strategy = &report.strategy;
        let result = &report.result;
        let now = run.now;

        writeln!(out, "{}:", strategy.name)?;
        writeln!(out, "\tInstrument: {}", self.paint(&strategy.instrument, Color::Blue))?;
        writeln!(
            out,
            "\tWeekdays: {}",
            strategy.weekdays.iter().join(", ")
        )?;
        writeln!(
            out,
            "\tTimes: {}",
            strategy.times.iter().map(|t| t.format("%H:%M")).join(", ")
        )?;
        writeln!(out, "\tMomentum offset: {}h", strategy.offset_hours)?;
        if let Some(greater_than) = strategy.greater_than {
            writeln!(out, "\tGreater than: {:.2}%", greater_than)?;
        }
        if let Some(less_than) = strategy.less_than {
            writeln!(out, "\tLess than: {:.2}%", less_than)?;
        }
        writeln!(out, "\tSide: {}", self.side(strategy.direction))?;
        writeln!(out, "\tCurrent price: {:.4}", result.latest_bar.close)?;
        match &result.anchor_bar {
            Some(anchor) => {
                writeln!(out, "\tMomentum price: {:.4}", anchor.open)?;
                writeln!(
                    out,
                    "\tMomentum time: {} UTC",
                    anchor.timestamp.format("%Y-%m-%d %H:%M")
                )?;
            }
            None => writeln!(out, "\tMomentum price: {}", self.paint("missing", Color::Red))?,
        }
        writeln!(
            out,
            "\tCurrent weekday: {} ({})",
            now.format("%A"),
            self.flag(result.weekday_matches)
        )?;
        writeln!(
            out,
            "\tCurrent time of day: {} UTC ({})",
            now.format("%H:%M"),
            self.flag(result.time_matches)
        )?;
        let momentum = match result.finite_momentum() {
            Some(m) => format!("{:+.2}%", m),
            None => self.paint("undefined", Color::Red),
        };
        writeln!(
            out,
            "\tCurrent momentum: {} ({})",
            momentum,
            self.flag(result.momentum_matches)
        )?;
        if result.all_match {
            writeln!(
                out,
                "\n\tAll conditions match, open \"{}\" position",
                self.side(strategy.direction)
            )?;
        }
        writeln!(out)
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, run: &EvaluationRun, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out)?;
        for report in &run.reports {
            if self.active_weekdays_only && !report.result.weekday_matches {
                continue;
            }
            self.write_strategy(run, report, out)?;
        }
        Ok(())
    }
}

/// Pretty-printed JSON of the whole run
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn report(&self, run: &EvaluationRun, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, run)?;
        writeln!(out)
    }
}
