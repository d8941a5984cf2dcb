use crate::application::{
    Action, AdminApp, AdminMode, AdminScreen, FormRow, IdentityField, PortalApp, PortalMode, PortalScreen, TextInput,
};
use crate::domain::{ApplicationStatus, FileRecord, FileStatus, Permissions};
use crate::infrastructure::ApplicationService;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

fn split_screen(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default().bg(Color::Blue).fg(Color::White)
    } else {
        Style::default()
    }
}

fn application_status_style(status: ApplicationStatus) -> Style {
    match status {
        ApplicationStatus::Draft => Style::default().fg(Color::Yellow),
        ApplicationStatus::Sent => Style::default().fg(Color::Cyan),
        ApplicationStatus::Complete => Style::default().fg(Color::Green),
    }
}

fn file_status_style(status: FileStatus) -> Style {
    match status {
        FileStatus::Draft => Style::default().fg(Color::Yellow),
        FileStatus::Sent => Style::default().fg(Color::Cyan),
        FileStatus::Accepted => Style::default().fg(Color::Green),
        FileStatus::Rejected => Style::default().fg(Color::Red),
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Prompt text for the status bar and the column, in characters, where the
/// input cursor sits.
fn prompt_line(label: &str, input: &TextInput, hint: &str) -> (String, usize) {
    let prefix = format!("{}: ", label);
    let column = prefix.chars().count() + input.cursor();
    (format!("{}{} ({})", prefix, input.text(), hint), column)
}

fn render_status_bar(f: &mut Frame, area: Rect, text: String, cursor: Option<usize>, style: Style) {
    let bar = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(bar, area);

    if let Some(column) = cursor {
        let max_x = area.x + area.width.saturating_sub(2);
        let x = (area.x + 1).saturating_add(column as u16).min(max_x);
        f.set_cursor_position((x, area.y + 1));
    }
}

fn file_line(file: &FileRecord) -> String {
    let mut line = format!("    {} ({}) [{}]", file.original_name, human_size(file.size_bytes), file.status);
    if let Some(choice) = &file.choice {
        line.push_str(&format!(" {}", choice));
    }
    line
}

// --- portal ---

pub fn render_portal<S: ApplicationService>(f: &mut Frame, app: &PortalApp<S>) {
    let [header, body, status] = split_screen(f.area());

    let title = match app.screen {
        PortalScreen::Search => "horse-id portal | Search".to_string(),
        PortalScreen::Application => match &app.form.snapshot {
            Some(detail) => format!(
                "horse-id portal | {} | {}",
                detail.application.display_name(),
                detail.application.status
            ),
            None => "horse-id portal | New application".to_string(),
        },
    };
    f.render_widget(Paragraph::new(title).style(Style::default().fg(Color::Cyan)), header);

    match app.screen {
        PortalScreen::Search => render_portal_results(f, app, body),
        PortalScreen::Application => render_portal_form(f, app, body),
    }
    render_portal_status_bar(f, app, status);

    if app.mode == PortalMode::Help {
        render_help_popup(f, "Portal keys", PORTAL_HELP, app.help_scroll);
    }
}

fn render_portal_results<S: ApplicationService>(f: &mut Frame, app: &PortalApp<S>, area: Rect) {
    let header = Row::new(vec!["Horse", "Year", "Status"]).style(Style::default().fg(Color::Yellow));
    let rows: Vec<Row> = app
        .results
        .iter()
        .enumerate()
        .map(|(i, a)| {
            Row::new(vec![
                Cell::from(a.display_name()),
                Cell::from(a.year_text()),
                Cell::from(a.status.as_str()).style(application_status_style(a.status)),
            ])
            .style(selected_style(i == app.selected_result))
        })
        .collect();

    let title = if app.search_query.is_empty() {
        "Applications".to_string()
    } else {
        format!("Applications matching \"{}\"", app.search_query)
    };
    let table = Table::new(
        rows,
        [Constraint::Min(20), Constraint::Length(6), Constraint::Length(10)],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .column_spacing(1);
    f.render_widget(table, area);
}

fn render_portal_form<S: ApplicationService>(f: &mut Frame, app: &PortalApp<S>, area: Rect) {
    let permissions = app.permissions();
    let rows: Vec<Row> = app
        .form
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let selected = i == app.form.cursor;
            portal_row(app, &permissions, row).style(selected_style(selected))
        })
        .collect();

    let block_title = if permissions.submit {
        "Application (s: submit)"
    } else {
        "Application"
    };
    let table = Table::new(rows, [Constraint::Min(40), Constraint::Length(24)])
        .block(Block::default().borders(Borders::ALL).title(block_title))
        .column_spacing(1);
    f.render_widget(table, area);
}

fn portal_row<'a, S: ApplicationService>(app: &'a PortalApp<S>, permissions: &Permissions, row: &FormRow) -> Row<'a> {
    match row {
        FormRow::Field(field) => {
            let value = match (&app.mode, field) {
                (PortalMode::Editing(editing), _) if editing == field => app.input.text().to_string(),
                (_, IdentityField::Year) if app.form.year.is_empty() => "-".to_string(),
                _ => app.form.field(*field).to_string(),
            };
            let lock = if permissions.edit_metadata { "" } else { "locked" };
            Row::new(vec![
                Cell::from(format!("{}: {}", field.label(), value)),
                Cell::from(lock).style(Style::default().fg(Color::DarkGray)),
            ])
        }
        FormRow::Section(file_type) => {
            let mut label = file_type.label().to_string();
            if let Some(choice) = app.form.choice(*file_type) {
                label.push_str(&format!(" <{}>", choice));
            }
            let (hint, style) = if app.is_busy(&Action::Upload(*file_type)) {
                ("uploading...", Style::default().fg(Color::Magenta))
            } else if permissions.upload(*file_type) {
                ("Enter: attach", Style::default().fg(Color::Green))
            } else {
                ("not available", Style::default().fg(Color::DarkGray))
            };
            Row::new(vec![
                Cell::from(label).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(hint).style(style),
            ])
        }
        FormRow::File { file_id, .. } => match app.form.file(file_id) {
            Some(file) => {
                let hint = if app.can_delete(file) { "Enter: delete" } else { "" };
                Row::new(vec![
                    Cell::from(file_line(file)).style(file_status_style(file.status)),
                    Cell::from(hint).style(Style::default().fg(Color::DarkGray)),
                ])
            }
            None => Row::new(vec![Cell::from(""), Cell::from("")]),
        },
    }
}

fn render_portal_status_bar<S: ApplicationService>(f: &mut Frame, app: &PortalApp<S>, area: Rect) {
    let (text, cursor) = match &app.mode {
        PortalMode::Normal => match &app.status_message {
            Some(message) => (message.clone(), None),
            None => match app.screen {
                PortalScreen::Search => ("/: search | Enter: open | n: new application | r: reload | F1/?: help | q: quit".to_string(), None),
                PortalScreen::Application => ("Enter: edit/attach/delete | c: change choice | s: submit | r: refresh | Esc: back | F1/?: help".to_string(), None),
            },
        },
        PortalMode::Searching => {
            let (text, column) = prompt_line("Search", &app.input, "Enter to search, Esc to cancel");
            (text, Some(column))
        }
        PortalMode::Editing(field) => {
            let (text, column) = prompt_line(field.label(), &app.input, "Enter to keep, Esc to cancel");
            (text, Some(column))
        }
        PortalMode::UploadPath(file_type) => {
            let label = format!("Attach to {}", file_type.label());
            let hint = if file_type.is_single_slot() {
                "Enter to upload, Esc to cancel"
            } else {
                "separate several paths with ';', Enter to upload, Esc to cancel"
            };
            let (text, column) = prompt_line(&label, &app.input, hint);
            (text, Some(column))
        }
        PortalMode::ConfirmDelete(_) => (app.status_message.clone().unwrap_or_default(), None),
        PortalMode::Help => ("↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(), None),
    };
    let style = match app.mode {
        PortalMode::Normal => Style::default(),
        PortalMode::Searching | PortalMode::Editing(_) => Style::default().fg(Color::Green),
        PortalMode::UploadPath(_) => Style::default().fg(Color::Magenta),
        PortalMode::ConfirmDelete(_) => Style::default().fg(Color::Red),
        PortalMode::Help => Style::default().fg(Color::Cyan),
    };
    render_status_bar(f, area, text, cursor, style);
}

// --- admin ---

pub fn render_admin<S: ApplicationService>(f: &mut Frame, app: &AdminApp<S>) {
    let [header, body, status] = split_screen(f.area());

    let title = match (&app.screen, &app.detail) {
        (AdminScreen::Detail, Some(detail)) => format!(
            "horse-id admin | {} | {}",
            detail.application.short_name(),
            detail.application.status
        ),
        _ => format!("horse-id admin | Filter: {}", app.filter_label()),
    };
    f.render_widget(Paragraph::new(title).style(Style::default().fg(Color::Cyan)), header);

    match app.screen {
        AdminScreen::List => render_admin_listing(f, app, body),
        AdminScreen::Detail => render_admin_detail(f, app, body),
    }
    render_admin_status_bar(f, app, status);

    if app.mode == AdminMode::Help {
        render_help_popup(f, "Console keys", ADMIN_HELP, app.help_scroll);
    }
}

fn render_admin_listing<S: ApplicationService>(f: &mut Frame, app: &AdminApp<S>, area: Rect) {
    let header = Row::new(vec!["Horse", "Year", "Status", "Created"]).style(Style::default().fg(Color::Yellow));
    let rows: Vec<Row> = app
        .listing
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let created = a.created_at.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_default();
            Row::new(vec![
                Cell::from(a.short_name()),
                Cell::from(a.year_text()),
                Cell::from(a.status.as_str()).style(application_status_style(a.status)),
                Cell::from(created),
            ])
            .style(selected_style(i == app.selected))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(format!("Applications ({})", app.listing.len())))
    .column_spacing(1);
    f.render_widget(table, area);
}

fn render_admin_detail<S: ApplicationService>(f: &mut Frame, app: &AdminApp<S>, area: Rect) {
    let Some(detail) = &app.detail else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let a = &detail.application;
    let flags: Vec<&str> = [
        (a.mare_ownership_confirmed, "mare ownership confirmed"),
        (a.genetic_done_through_association, "genetics via association"),
        (a.genetic_pending, "genetics pending"),
    ]
    .iter()
    .filter(|(set, _)| *set)
    .map(|(_, label)| *label)
    .collect();
    let summary = format!(
        "Russian: {}\nEnglish: {}\nYear: {}   Status: {}\n{}",
        a.horse_name_ru.as_deref().unwrap_or("-"),
        a.horse_name_en.as_deref().unwrap_or("-"),
        a.year_text(),
        a.status,
        flags.join(", ")
    );
    f.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title(format!("Application {}", a.id))),
        chunks[0],
    );

    let rows: Vec<Row> = app
        .visible_files()
        .iter()
        .enumerate()
        .map(|(i, file)| {
            Row::new(vec![
                Cell::from(file.file_type.label()),
                Cell::from(file.original_name.clone()),
                Cell::from(file.choice.clone().unwrap_or_default()),
                Cell::from(human_size(file.size_bytes)),
                Cell::from(file.status.as_str()).style(file_status_style(file.status)),
            ])
            .style(selected_style(i == app.selected_file))
        })
        .collect();
    let header = Row::new(vec!["Type", "File", "Choice", "Size", "Status"]).style(Style::default().fg(Color::Yellow));
    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Files"))
    .column_spacing(1);
    f.render_widget(table, chunks[1]);
}

fn render_admin_status_bar<S: ApplicationService>(f: &mut Frame, app: &AdminApp<S>, area: Rect) {
    let (text, cursor) = match &app.mode {
        AdminMode::Normal => match &app.status_message {
            Some(message) => (message.clone(), None),
            None => match app.screen {
                AdminScreen::List => ("/: search | f: filter | Enter: open | r: reload | e: export CSV | F1/?: help | q: quit".to_string(), None),
                AdminScreen::Detail => {
                    let mut keys = String::new();
                    if app.selected_awaits_review() {
                        keys.push_str("a: accept | x: reject | ");
                    }
                    keys.push_str("d: delete | c: mark complete | r: refresh | Esc: back");
                    (keys, None)
                }
            },
        },
        AdminMode::Searching => {
            let (text, column) = prompt_line("Search", &app.input, "Enter to search, Esc to cancel");
            (text, Some(column))
        }
        AdminMode::ExportPath => {
            let (text, column) = prompt_line("Export CSV as", &app.input, "Enter to export, Esc to cancel");
            (text, Some(column))
        }
        AdminMode::ConfirmComplete | AdminMode::ConfirmDelete(_) => (app.status_message.clone().unwrap_or_default(), None),
        AdminMode::Help => ("↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(), None),
    };
    let style = match app.mode {
        AdminMode::Normal => Style::default(),
        AdminMode::Searching => Style::default().fg(Color::Green),
        AdminMode::ExportPath => Style::default().fg(Color::Magenta),
        AdminMode::ConfirmComplete | AdminMode::ConfirmDelete(_) => Style::default().fg(Color::Red),
        AdminMode::Help => Style::default().fg(Color::Cyan),
    };
    render_status_bar(f, area, text, cursor, style);
}

// --- help ---

fn render_help_popup(f: &mut Frame, title: &str, text: &str, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let lines: Vec<&str> = text.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;
    let start_line = scroll.min(lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(lines.len());

    let help_widget = Paragraph::new(lines[start_line..end_line].join("\n"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} (Line {}/{})", title, start_line + 1, lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));
    f.render_widget(help_widget, popup_area);
}

const PORTAL_HELP: &str = r#"HORSE IDENTIFICATION PORTAL

=== SEARCH SCREEN ===
/               Search by horse name (empty search lists everything)
↑↓ or j/k       Move through the results
Enter           Open the selected application
n               Start a new application
r               Repeat the last search

=== APPLICATION SCREEN ===
↑↓ or j/k       Move between fields, sections and files
Enter           On a field: edit it
                On a section: attach a file (type the path)
                Multi-file sections take several paths split by ';'
                On a draft file: delete it (asks y/n)
c               Switch ownership/contract or breeding/certificate
s               Submit the application
r               Reload from the server
Esc             Back to the search screen

=== RULES ===
• Give the Russian or the English name, and a year from 1990 on
• The Russian name uses Cyrillic letters, the English name Latin letters
• Name and year are locked once any file has been sent
• Passport application, breeding record, foal act and genetic certificate
  take one file each; a rejected file frees the slot
• Only draft files of a draft application can be deleted
• Files up to 200 MB; executables and scripts are refused
• Nothing can be added to a complete application

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll one line
Page Up/Down    Scroll five lines
Home            Jump to the top
Esc/F1/?/q      Close this window"#;

const ADMIN_HELP: &str = r#"HORSE IDENTIFICATION CONSOLE

=== LIST SCREEN ===
/               Search by horse name
f               Cycle the status filter: all, draft, sent, complete
↑↓ or j/k       Move through the applications
Enter           Open the selected application
r               Reload the listing
e               Export the shown listing to CSV

=== DETAIL SCREEN ===
↑↓ or j/k       Move through the files (drafts are not shown)
a               Accept the selected sent file
x               Reject the selected sent file
d               Delete the selected file (asks y/n)
c               Mark the application complete (asks y/n)
r               Reload from the server
Esc             Back to the list

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll one line
Page Up/Down    Scroll five lines
Home            Jump to the top
Esc/F1/?/q      Close this window"#;
