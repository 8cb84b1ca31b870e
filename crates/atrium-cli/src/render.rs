//! Incremental rendering of a streamed reply from session events.

use std::io::{self, Write};

use atrium_core::chat::{ChatEvent, MessageRole};
use colored::Colorize;

/// Prints one partner's assistant text as it grows.
///
/// Each `ContentUpdated` carries the full text so far; only the suffix that
/// has not been printed yet is written.
pub struct StreamPrinter<W: Write> {
    out: W,
    partner_id: String,
    display_name: String,
    /// Message being printed and how many bytes of it are already out
    current: Option<(String, usize)>,
}

impl<W: Write> StreamPrinter<W> {
    pub fn new(out: W, partner_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            out,
            partner_id: partner_id.into(),
            display_name: display_name.into(),
            current: None,
        }
    }

    pub fn apply(&mut self, event: &ChatEvent) -> io::Result<()> {
        match event {
            ChatEvent::MessageAppended {
                partner_id,
                message,
            } if *partner_id == self.partner_id && message.role == MessageRole::Assistant => {
                write!(self.out, "{} ", format!("[{}]", self.display_name).bright_magenta())?;
                self.current = Some((message.id.clone(), 0));
            }
            ChatEvent::ContentUpdated {
                partner_id,
                message_id,
                content,
            } if *partner_id == self.partner_id => {
                if let Some((current_id, printed)) = self.current.as_mut() {
                    if current_id == message_id && content.len() > *printed {
                        // Content only grows, so the printed prefix is still valid
                        let suffix = content.get(*printed..).unwrap_or_default();
                        write!(self.out, "{}", suffix)?;
                        *printed = content.len();
                    }
                }
            }
            ChatEvent::StreamEnded { partner_id, .. } if *partner_id == self.partner_id => {
                if self.current.take().is_some() {
                    writeln!(self.out)?;
                }
            }
            ChatEvent::Failed { partner_id, error } if *partner_id == self.partner_id => {
                // Finish the partial line first
                if self.current.take().is_some() {
                    writeln!(self.out)?;
                }
                writeln!(self.out, "{}", format!("Error: {}", error).red())?;
            }
            _ => return Ok(()),
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
