//! Stateless UI rendering for the chess client.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;
use drawfish_game::{Color as Side, File, Piece, Rank, Role, Square};

/// Renders one frame: board, move list, and status bar.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(12),   // Board and move list
            Constraint::Length(5), // Status
        ])
        .split(frame.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(26),    // Board
            Constraint::Length(26), // Move list
        ])
        .split(chunks[0]);

    draw_board(frame, top[0], app);
    draw_moves(frame, top[1], app);
    draw_status(frame, chunks[1], app);
}

fn draw_board(frame: &mut Frame, area: Rect, app: &App) {
    let board = app.view().board();

    let mut lines = Vec::with_capacity(9);
    for rank in Rank::ALL.iter().rev() {
        let mut spans = vec![Span::styled(
            format!("{} ", rank.char()),
            Style::default().fg(Color::DarkGray),
        )];
        for file in File::ALL {
            let square = Square::from_coords(file, *rank);
            spans.push(square_span(app, board.piece_at(square), square));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(Span::styled(
        "  a b c d e f g h",
        Style::default().fg(Color::DarkGray),
    )));

    let title = format!("drawfish ({})", app.session());
    let widget = Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn square_span(app: &App, piece: Option<Piece>, square: Square) -> Span<'static> {
    let dark = (square.file() as usize + square.rank() as usize) % 2 == 0;
    let mut style = Style::default().bg(if dark { Color::DarkGray } else { Color::Gray });
    if app.selected() == Some(square) {
        style = style.bg(Color::Cyan);
    }
    if app.cursor() == square {
        style = style.bg(Color::Yellow);
    }
    let style = match piece.map(|p| p.color) {
        Some(Side::White) => style.fg(Color::White).add_modifier(Modifier::BOLD),
        Some(Side::Black) => style.fg(Color::Black),
        None => style,
    };
    let text = match piece {
        Some(piece) => format!("{} ", glyph(piece)),
        None => "  ".to_string(),
    };
    Span::styled(text, style)
}

fn glyph(piece: Piece) -> char {
    match (piece.color, piece.role) {
        (Side::White, Role::King) => '♔',
        (Side::White, Role::Queen) => '♕',
        (Side::White, Role::Rook) => '♖',
        (Side::White, Role::Bishop) => '♗',
        (Side::White, Role::Knight) => '♘',
        (Side::White, Role::Pawn) => '♙',
        (Side::Black, Role::King) => '♚',
        (Side::Black, Role::Queen) => '♛',
        (Side::Black, Role::Rook) => '♜',
        (Side::Black, Role::Bishop) => '♝',
        (Side::Black, Role::Knight) => '♞',
        (Side::Black, Role::Pawn) => '♟',
    }
}

fn draw_moves(frame: &mut Frame, area: Rect, app: &App) {
    let timeline = app.view().timeline();
    let cursor = timeline.cursor();

    let mut lines = Vec::new();
    if timeline.is_empty() {
        lines.push(Line::from(Span::styled(
            "(no moves yet)",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (row, pair) in timeline.records().chunks(2).enumerate() {
        let mut spans = vec![Span::styled(
            format!("{:>3}. ", row + 1),
            Style::default().fg(Color::DarkGray),
        )];
        for (offset, record) in pair.iter().enumerate() {
            let style = if cursor == Some(row * 2 + offset) {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!("{:<8}", record.san), style));
        }
        lines.push(Line::from(spans));
    }

    // Keep the row under the cursor visible once the list outgrows the pane
    let visible = area.height.saturating_sub(2) as usize;
    let row = cursor.map_or(0, |i| i / 2);
    let scroll = (row + 1).saturating_sub(visible) as u16;

    let widget = Paragraph::new(lines)
        .block(Block::default().title("Moves").borders(Borders::ALL))
        .scroll((scroll, 0));
    frame.render_widget(widget, area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let view = app.view();
    let board = view.board();

    let headline = if app.busy() {
        Span::styled("Bot is thinking...", Style::default().fg(Color::Yellow))
    } else if let Some(outcome) = board.outcome() {
        Span::styled(
            format!("Game over: {}", outcome),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        let mut text = match board.turn() {
            Side::White => "White to move".to_string(),
            Side::Black => "Black to move".to_string(),
        };
        if !view.timeline().at_latest() {
            let shown = view.timeline().cursor().map_or(0, |i| i + 1);
            text.push_str(&format!(
                " [viewing ply {}/{}]",
                shown,
                view.timeline().len()
            ));
        }
        Span::from(text)
    };

    let lines = vec![
        Line::from(headline),
        Line::from(app.status()),
        Line::from(Span::styled(
            "arrows/hjkl: cursor  Enter: select  u/p: history  r: reset  q: quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}
