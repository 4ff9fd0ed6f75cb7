//! Terminal rendering of an activation report.
//!
//! Mirrors what the app shows: notification banners first, then the initial
//! tab as cards, one page at a time.

use std::fmt::{self, Write};

use whatsnew_core::Article;
use whatsnew_core::content::preview_text;
use whatsnew_core::view::{Paginator, Tab, cover_image, date_label};

use crate::check::{Report, initial_tab_articles};

const LABEL_WIDTH: usize = 12;
const PREVIEW_CHARS: usize = 120;

/// Print the report to stdout, showing `pages` pages of cards.
pub fn print_report(report: &Report, pages: usize) -> fmt::Result {
    let mut out = String::new();
    render_report(&mut out, report, pages)?;
    print!("{out}");
    Ok(())
}

pub fn render_report(out: &mut impl Write, report: &Report, pages: usize) -> fmt::Result {
    let tab = report.notification.initial_tab();

    writeln!(out, "=== What's New ===")?;
    writeln!(
        out,
        "  {:<LABEL_WIDTH$} {} ({})",
        "installed",
        report.current_version,
        if report.channel.is_cloud() { "cloud" } else { "on-prem" }
    )?;
    writeln!(out)?;

    render_banners(out, report)?;

    let articles = initial_tab_articles(report);
    let heading = match tab {
        Tab::News => "News",
        Tab::ReleaseNotes => "Release Notes",
    };
    writeln!(out, "{heading} ({})", articles.len())?;
    if articles.is_empty() {
        return writeln!(out, "  {}", tab.empty_message());
    }

    let mut pager = Paginator::default();
    for _ in 1..pages.max(1) {
        pager.reveal_more();
    }
    for (idx, article) in pager.visible(&articles).iter().enumerate() {
        render_card(out, article)?;
        if pager.is_last_slot(idx) && articles.len() > pager.shown() {
            writeln!(out, "  ... and {} more", articles.len() - pager.shown())?;
        }
    }
    Ok(())
}

fn render_banners(out: &mut impl Write, report: &Report) -> fmt::Result {
    let notification = &report.notification;
    let mut any = false;

    if let Some(note) = &notification.upgrade_release_note {
        writeln!(out, "  You've been upgraded to {}", note.title)?;
        writeln!(out, "  {:<LABEL_WIDTH$} {}", "read more", note.link)?;
        any = true;
    }
    if notification.has_newer_release
        && let Some(latest) = &report.filter.latest_release
    {
        writeln!(out, "  {} is available", latest.title)?;
        writeln!(out, "  {:<LABEL_WIDTH$} {}", "details", latest.url)?;
        any = true;
    }
    if any {
        writeln!(out)?;
    }
    Ok(())
}

fn render_card(out: &mut impl Write, article: &Article) -> fmt::Result {
    let date = date_label(article.published)
        .map(|(day, year)| format!("{day} {year}"))
        .unwrap_or_else(|| "-".to_string());
    writeln!(out, "  [{date}] {}", article.title)?;
    let preview = preview_text(&article.description, PREVIEW_CHARS);
    if !preview.is_empty() {
        writeln!(out, "    {preview}")?;
    }
    writeln!(out, "    {:<LABEL_WIDTH$} {}", "link", article.link)?;
    writeln!(out, "    {:<LABEL_WIDTH$} {}", "cover", cover_image(article))
}
