//! Flat exports: one row per report line, no pagination, no images.

use crate::model::ReportRequest;

const HEADER: [&str; 2] = ["Field", "Value"];

pub fn to_csv(request: &ReportRequest) -> Vec<u8> {
    let mut out = String::new();
    push_row(&mut out, ',', &HEADER.map(csv_field));
    for line in &request.lines {
        push_row(&mut out, ',', &[csv_field(&line.key), csv_field(&line.value)]);
    }
    out.into_bytes()
}

/// Tab separated; tabs and line breaks inside values become spaces.
pub fn to_spreadsheet(request: &ReportRequest) -> Vec<u8> {
    let mut out = String::new();
    push_row(&mut out, '\t', &HEADER.map(String::from));
    for line in &request.lines {
        push_row(&mut out, '\t', &[tsv_field(&line.key), tsv_field(&line.value)]);
    }
    out.into_bytes()
}

fn push_row(out: &mut String, separator: char, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(field);
    }
    out.push_str("\r\n");
}

/// RFC 4180: quote when the field holds a comma, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn tsv_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}
