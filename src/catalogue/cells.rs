// src/catalogue/cells.rs
use calamine::{Data, Range};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Render one cell the way the rule authors see it in the workbook.
/// Text passes through, numbers keep a `.0` when integral, dates use the
/// platform date string, booleans become `true`/`false`, anything else is empty.
pub fn render_value(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(v) => render_number(*v),
        Data::Int(v) => render_number(*v as f64),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_datetime(serial)
                .map(render_date)
                .unwrap_or_else(|| render_number(serial))
        }
        Data::DateTimeIso(s) => s.clone(),
        _ => String::new(),
    }
}

/// `45` → `"45.0"`, `0.25` → `"0.25"`.
pub fn render_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// `Mon Jan 15 00:00:00 UTC 2024`
pub fn render_date(dt: NaiveDateTime) -> String {
    dt.format("%a %b %d %H:%M:%S UTC %Y").to_string()
}

/// Convert an Excel 1900-system serial (days since 1899-12-30, with the
/// fractional part as time of day) into a timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// Lay the value grid and the formula grid of one sheet over each other.
/// A non-empty formula replaces the cached value of its cell, so rules
/// written as formulas come through as their source text.
pub fn merge_sheet(values: &Range<Data>, formulas: Option<&Range<String>>) -> Vec<Vec<String>> {
    let formulas = formulas.filter(|f| !f.is_empty());
    let bounds = [
        values.start().zip(values.end()),
        formulas.and_then(|f| f.start().zip(f.end())),
    ];
    let Some(((r0, c0), (r1, c1))) = bounds.into_iter().flatten().reduce(|a, b| {
        let ((ar0, ac0), (ar1, ac1)) = a;
        let ((br0, bc0), (br1, bc1)) = b;
        ((ar0.min(br0), ac0.min(bc0)), (ar1.max(br1), ac1.max(bc1)))
    }) else {
        return Vec::new();
    };

    let mut rows = Vec::with_capacity((r1 - r0 + 1) as usize);
    for r in r0..=r1 {
        let mut row = Vec::with_capacity((c1 - c0 + 1) as usize);
        for c in c0..=c1 {
            let formula = formulas
                .and_then(|f| f.get_value((r, c)))
                .filter(|f| !f.is_empty());
            let text = match formula {
                Some(f) => f.clone(),
                None => values
                    .get_value((r, c))
                    .map(render_value)
                    .unwrap_or_default(),
            };
            row.push(text);
        }
        rows.push(row);
    }
    rows
}
