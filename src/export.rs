//! CSV renderings of the article table and a daily series.
//!
//! Fields are quoted only when needed (comma, double quote, CR or LF inside)
//! with inner quotes doubled. Records end in CRLF.

use anyhow::{Context, Result};
use csv::{Terminator, WriterBuilder};

use crate::aggregate::DailyAggregate;
use crate::table::ScopedArticleRecord;
use crate::taxonomy::KeywordTags;

pub const ARTICLES_HEADER: [&str; 11] = [
    "scope",
    "published_at",
    "date",
    "source",
    "title",
    "url",
    "polarity",
    "subjectivity",
    "sentiment_label",
    "flagged",
    "keyword_tags",
];

fn writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new())
}

fn finish(w: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = w.into_inner().context("flushing csv buffer")?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

/// `category:kw1|kw2;category2:kw`, taxonomy order.
pub fn render_tags(tags: &KeywordTags) -> String {
    tags.iter()
        .map(|(cat, kws)| format!("{}:{}", cat, kws.join("|")))
        .collect::<Vec<_>>()
        .join(";")
}

/// Full article table, one row per record in table order.
pub fn articles_csv(records: &[ScopedArticleRecord]) -> Result<String> {
    let mut w = writer();
    w.write_record(ARTICLES_HEADER)?;
    for r in records {
        w.write_record([
            r.scope.as_str().to_string(),
            r.published_at.clone().unwrap_or_default(),
            r.date.map(|d| d.to_string()).unwrap_or_default(),
            r.source.clone().unwrap_or_default(),
            r.title.clone().unwrap_or_default(),
            r.url.clone(),
            r.polarity.to_string(),
            r.subjectivity.to_string(),
            r.sentiment_label.as_str().to_string(),
            r.flagged.to_string(),
            render_tags(&r.keyword_tags),
        ])?;
    }
    finish(w)
}

/// One row per date; a category with no score that day is left empty, as is
/// a missing `avg_polarity`.
pub fn daily_csv(series: &[DailyAggregate], categories: &[String]) -> Result<String> {
    let mut w = writer();
    let mut header: Vec<&str> = vec!["date"];
    header.extend(categories.iter().map(String::as_str));
    header.extend(["overall_risk", "avg_polarity"]);
    w.write_record(&header)?;

    for row in series {
        let mut cells = Vec::with_capacity(categories.len() + 3);
        cells.push(row.date.to_string());
        for cat in categories {
            cells.push(row.categories.get(cat).map(|v| v.to_string()).unwrap_or_default());
        }
        cells.push(row.overall_risk.to_string());
        cells.push(row.avg_polarity.map(|p| p.to_string()).unwrap_or_default());
        w.write_record(&cells)?;
    }
    finish(w)
}
