//! UI Components for the terminal interface

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};
use ratatui::Frame;

use super::{LogLevel, Phase, Progress};

/// Status panel showing current phase, step counter and info
pub struct StatusPanel {
    phase: Phase,
    step: Option<(usize, usize, String)>,
    info: String,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self {
            phase: Phase::Checking,
            step: None,
            info: String::new(),
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_step(&mut self, current: usize, total: usize, name: impl Into<String>) {
        self.step = Some((current, total, name.into()));
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let phase_style = match self.phase {
            Phase::Complete => Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            _ => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        };

        let phase_indicator = match self.phase {
            Phase::Checking => "◐",
            Phase::Downloading => "↓",
            Phase::Preprocessing => "⤷",
            Phase::Generating => "⚙",
            Phase::Loading => "⇣",
            Phase::Complete => "✓",
        };

        let mut header = vec![
            Span::styled(format!(" {} ", phase_indicator), phase_style),
            Span::styled(self.phase.to_string(), phase_style),
        ];
        if let Some((current, total, name)) = &self.step {
            header.push(Span::styled(
                format!("  [{}/{}] {}", current, total, name),
                Style::default().fg(Color::White),
            ));
        }

        let lines = vec![
            Line::from(header),
            Line::from(""),
            Line::from(vec![
                Span::raw("   "),
                Span::styled(&self.info, Style::default().fg(Color::Gray)),
            ]),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Accidents CSV to SQL ")
            .border_style(Style::default().fg(Color::Blue));

        let paragraph = Paragraph::new(lines).block(block);
        frame.render_widget(paragraph, area);
    }
}

/// Progress panel showing a row counter gauge
pub struct ProgressPanel {
    progress: Option<Progress>,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self { progress: None }
    }

    pub fn set_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    pub fn clear(&mut self) {
        self.progress = None;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::Blue));

        let Some(progress) = &self.progress else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let label = if progress.total > 0 {
            format!(
                "{}: {}/{} ({:.0}%)",
                progress.label,
                progress.current,
                progress.total,
                progress.ratio() * 100.0
            )
        } else {
            progress.label.clone()
        };

        let gauge = Gauge::default()
            .block(block)
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .ratio(progress.ratio().min(1.0))
            .label(label);

        frame.render_widget(gauge, area);
    }
}

/// Log panel showing the most recent entries, warnings highlighted
pub struct LogPanel {
    entries: Vec<(LogLevel, String)>,
    max_entries: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 200,
        }
    }

    pub fn add(&mut self, level: LogLevel, message: impl Into<String>) {
        self.entries.push((level, message.into()));
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(level, _)| *level == LogLevel::Warn)
            .count()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let title = match self.warning_count() {
            0 => " Activity ".to_string(),
            n => format!(" Activity ({} warnings) ", n),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Blue));

        let visible_height = area.height.saturating_sub(2) as usize; // -2 for borders
        let start = self.entries.len().saturating_sub(visible_height);
        let last = self.entries.len().saturating_sub(1);

        let items: Vec<ListItem> = self.entries[start..]
            .iter()
            .enumerate()
            .map(|(i, (level, entry))| {
                let style = match level {
                    LogLevel::Warn => Style::default().fg(Color::Yellow),
                    LogLevel::Info if start + i == last => Style::default().fg(Color::White),
                    LogLevel::Info => Style::default().fg(Color::DarkGray),
                };
                ListItem::new(Span::styled(format!(" {}", entry), style))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_widget(list, area);
    }
}
