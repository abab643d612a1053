//! TUI module - week calendar dashboard with ratatui

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::io::{Stdout, stdout};

use crate::db::Database;
use crate::plan::WorkoutPlan;
use crate::schedule;
use crate::tracker::WorkoutPerformance;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// App state for TUI
pub struct App {
    db: Database,
    plan: Option<WorkoutPlan>,
    performances: Vec<WorkoutPerformance>,
    week_offset: i64,
    should_quit: bool,
}

impl App {
    pub fn new(db: Database) -> Result<Self> {
        let plan = db.plans()?.pop();
        let performances = db.performances()?;
        Ok(Self {
            db,
            plan,
            performances,
            week_offset: 0,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let plan_name = self
            .plan
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("no plan loaded");
        let header = Paragraph::new(format!("liftlog - {}", plan_name))
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        // Week calendar strip
        let days = schedule::week_days(self.week_offset);
        let (start, end) = schedule::week_range(self.week_offset);

        let day_cells: Vec<Cell> = days
            .iter()
            .map(|d| {
                let label = format!("{} {}", d.day_name, d.day_number);
                let style = if d.is_today {
                    Style::default().fg(Color::Yellow).bold()
                } else {
                    Style::default()
                };
                Cell::from(label).style(style)
            })
            .collect();

        let workout_cells: Vec<Cell> = days
            .iter()
            .map(|d| {
                let name = self
                    .plan
                    .as_ref()
                    .and_then(|p| schedule::workout_for_date(p, d.date))
                    .map(|w| w.name.clone())
                    .unwrap_or_else(|| "Rest".to_string());
                let logged = self.performances.iter().any(|p| p.date == d.iso_date);
                let style = if logged {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Gray)
                };
                Cell::from(name).style(style)
            })
            .collect();

        let week = Table::new(
            vec![Row::new(day_cells), Row::new(workout_cells)],
            [Constraint::Ratio(1, 7); 7],
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Week {} - {}", start, end)),
        );
        frame.render_widget(week, chunks[1]);

        // Recent sessions table
        let rows: Vec<Row> = self
            .performances
            .iter()
            .map(|p| {
                let workout = self
                    .plan
                    .as_ref()
                    .and_then(|plan| plan.days.iter().find(|d| d.id == p.workout_day_id))
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| p.workout_day_id.clone());
                let logged = p
                    .exercises
                    .iter()
                    .filter(|e| e.completed_sets > 0)
                    .count();
                Row::new(vec![
                    Cell::from(p.date.clone()),
                    Cell::from(workout),
                    Cell::from(format!("{}/{}", logged, p.exercises.len())),
                    Cell::from(
                        p.overall_rating
                            .map(|r| format!("{}/5", r))
                            .unwrap_or_default(),
                    ),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(20),
                Constraint::Length(10),
                Constraint::Min(8),
            ],
        )
        .header(
            Row::new(vec!["Date", "Workout", "Exercises", "Rating"])
                .style(Style::default().bold()),
        )
        .block(Block::default().borders(Borders::ALL).title("Sessions"));

        frame.render_widget(table, chunks[2]);

        // Footer
        let footer = Paragraph::new("q: quit | r: reload | h/l: prev/next week | t: today")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('r') => {
                    self.plan = self.db.plans()?.pop();
                    self.performances = self.db.performances()?;
                }
                KeyCode::Char('h') | KeyCode::Left => self.week_offset -= 1,
                KeyCode::Char('l') | KeyCode::Right => self.week_offset += 1,
                KeyCode::Char('t') => self.week_offset = 0,
                _ => {}
            }
        }
        Ok(())
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
