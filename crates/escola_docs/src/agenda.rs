use chrono::{Datelike, NaiveDate};
use escola_core::{EscolaConfig, EscolaError, Result};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook, XlsxError};
use tracing::info;

use crate::output::{Delivered, Delivery, GeneratedDocument, XLSX_MIME};
use crate::text::path_safe;

pub const MONTHS: [&str; 12] = [
    "JANEIRO", "FEVEREIRO", "MARÇO", "ABRIL", "MAIO", "JUNHO", "JULHO", "AGOSTO", "SETEMBRO",
    "OUTUBRO", "NOVEMBRO", "DEZEMBRO",
];

pub const WEEKDAYS: [&str; 5] = [
    "SEGUNDA-FEIRA",
    "TERÇA-FEIRA",
    "QUARTA-FEIRA",
    "QUINTA-FEIRA",
    "SEXTA-FEIRA",
];

pub const LESSONS_PER_DAY: u32 = 9;

/// First worksheet row (0-based) of the first week block.
const FIRST_BLOCK_ROW: u32 = 2;
/// Header row + date row + lesson rows.
const BLOCK_HEIGHT: u32 = LESSONS_PER_DAY + 2;
const COLUMN_WIDTH: f64 = 18.0;
const ROW_HEIGHT: f64 = 20.0;

const TITLE_FILL: u32 = 0xD9E1F2;
const HEADER_FILL: u32 = 0x4F81BD;
const LESSON_FILL: u32 = 0xF2F2F2;

/// Monday to Friday of one week; `None` for days outside the month.
pub type Week = [Option<u32>; 5];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaRequest {
    pub mes: u32,
    pub ano: i32,
    pub professor: String,
}

impl AgendaRequest {
    fn validate(&self) -> Result<NaiveDate> {
        if !(1..=12).contains(&self.mes) {
            return Err(EscolaError::invalid(format!(
                "Mês inválido: {} (esperado 1 a 12)",
                self.mes
            )));
        }
        if self.professor.trim().is_empty() {
            return Err(EscolaError::missing(["professor"]));
        }
        NaiveDate::from_ymd_opt(self.ano, self.mes, 1)
            .ok_or_else(|| EscolaError::invalid(format!("Ano inválido: {}", self.ano)))
    }

    pub fn month_name(&self) -> &'static str {
        MONTHS[(self.mes.clamp(1, 12) - 1) as usize]
    }
}

/// `"1ª aula"` .. `"9ª aula"`.
pub fn lesson_labels() -> Vec<String> {
    (1..=LESSONS_PER_DAY).map(|i| format!("{i}ª aula")).collect()
}

/// Monday-first weeks of the month, restricted to Monday..Friday. Weeks that
/// contain no weekday of the month (a month starting on a weekend) are
/// skipped.
pub fn month_weeks(mes: u32, ano: i32) -> Result<Vec<Week>> {
    let first = NaiveDate::from_ymd_opt(ano, mes, 1)
        .ok_or_else(|| EscolaError::invalid(format!("Data inválida: {mes:02}/{ano}")))?;
    let days = days_in_month(first)?;
    let offset = first.weekday().num_days_from_monday();

    let mut weeks = Vec::new();
    let mut week: Week = [None; 5];
    for day in 1..=days {
        let weekday = (offset + day - 1) % 7;
        if weekday < 5 {
            week[weekday as usize] = Some(day);
        }
        if weekday == 6 || day == days {
            if week.iter().any(Option::is_some) {
                weeks.push(week);
            }
            week = [None; 5];
        }
    }
    Ok(weeks)
}

fn days_in_month(first: NaiveDate) -> Result<u32> {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let next = next.ok_or_else(|| EscolaError::invalid("Ano fora do intervalo suportado"))?;
    Ok(next.signed_duration_since(first).num_days() as u32)
}

pub fn agenda_file_name(req: &AgendaRequest) -> String {
    format!(
        "Agenda_{}_{:02}_{}.xlsx",
        path_safe(&req.professor).replace(' ', "_"),
        req.mes,
        req.ano
    )
}

fn xlsx_err(e: XlsxError) -> EscolaError {
    EscolaError::Render(format!("planilha da agenda: {e}"))
}

/// Cell styles of the agenda sheet.
struct AgendaFormats {
    title: Format,
    header: Format,
    date: Format,
    bordered: Format,
    lesson_label: Format,
    lesson_first_row: Format,
}

impl AgendaFormats {
    fn new() -> Self {
        let centered = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        let bordered = Format::new().set_border(FormatBorder::Thin);

        Self {
            title: centered
                .clone()
                .set_bold()
                .set_font_size(14)
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(TITLE_FILL)),
            header: centered
                .clone()
                .set_bold()
                .set_font_color(Color::White)
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_border(FormatBorder::Thin),
            date: centered.clone().set_bold().set_border(FormatBorder::Thin),
            lesson_label: centered
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(LESSON_FILL))
                .set_border(FormatBorder::Thin),
            lesson_first_row: bordered
                .clone()
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(LESSON_FILL)),
            bordered,
        }
    }
}

/// Build the monthly agenda workbook and return its bytes.
pub fn build_agenda(req: &AgendaRequest) -> Result<Vec<u8>> {
    req.validate()?;
    let weeks = month_weeks(req.mes, req.ano)?;
    let formats = AgendaFormats::new();
    let lessons = lesson_labels();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(format!("Agenda {:02}-{}", req.mes, req.ano))
        .map_err(xlsx_err)?;

    let title = format!(
        "AGENDA PROFESSOR: {} - {} {}",
        req.professor.to_uppercase(),
        req.month_name(),
        req.ano
    );
    sheet
        .merge_range(0, 0, 0, 5, &title, &formats.title)
        .map_err(xlsx_err)?;

    let mut row = FIRST_BLOCK_ROW;
    for week in &weeks {
        sheet
            .write_string_with_format(row, 0, "AULAS", &formats.header)
            .map_err(xlsx_err)?;

        for (idx, day) in week.iter().enumerate() {
            let col = (idx + 1) as u16;
            match day {
                Some(day) => {
                    sheet
                        .write_string_with_format(row, col, WEEKDAYS[idx], &formats.header)
                        .map_err(xlsx_err)?;
                    sheet
                        .write_string_with_format(
                            row + 1,
                            col,
                            format!("{day:02}/{:02}", req.mes),
                            &formats.date,
                        )
                        .map_err(xlsx_err)?;
                }
                None => {
                    sheet
                        .write_blank(row, col, &formats.header)
                        .map_err(xlsx_err)?;
                    sheet
                        .write_blank(row + 1, col, &formats.bordered)
                        .map_err(xlsx_err)?;
                }
            }
        }

        for (i, lesson) in lessons.iter().enumerate() {
            let lesson_row = row + 2 + i as u32;
            sheet
                .write_string_with_format(lesson_row, 0, lesson, &formats.lesson_label)
                .map_err(xlsx_err)?;
            let cell_format = if i == 0 {
                &formats.lesson_first_row
            } else {
                &formats.bordered
            };
            for col in 1..=week.len() as u16 {
                sheet
                    .write_blank(lesson_row, col, cell_format)
                    .map_err(xlsx_err)?;
            }
        }

        row += BLOCK_HEIGHT;
    }

    for col in 0..7u16 {
        sheet.set_column_width(col, COLUMN_WIDTH).map_err(xlsx_err)?;
    }
    for r in 0..row {
        sheet.set_row_height(r, ROW_HEIGHT).map_err(xlsx_err)?;
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}

/// Build the agenda and deliver it. File delivery writes into the agenda
/// output directory.
pub fn generate_agenda(
    config: &EscolaConfig,
    req: &AgendaRequest,
    delivery: Delivery,
) -> Result<Delivered> {
    let bytes = build_agenda(req)?;
    let document = GeneratedDocument {
        file_name: agenda_file_name(req),
        mime_type: XLSX_MIME,
        bytes,
    };
    info!(
        professor = %req.professor,
        mes = req.mes,
        ano = req.ano,
        size = document.bytes.len(),
        "agenda generated"
    );

    let path = match delivery {
        Delivery::Base64 => None,
        Delivery::File => Some(document.write_to(&config.agenda_output_path())?),
    };
    Ok(Delivered { document, path })
}
