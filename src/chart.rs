// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Horizontal bar chart rendering.
//!
//! The pipeline only depends on the [`ChartRenderer`] trait. [`SvgBarChart`]
//! is the bundled implementation: a transparent SVG with one bar per language,
//! the most used language on top, and a percentage label next to or inside
//! every bar. Two themes differ only in label color so the chart stays
//! readable on light and dark profile pages.

use std::{
    borrow::Cow,
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path
};

use crate::{
    aggregate::LanguageShare,
    error::{self, Error}
};

const WIDTH: u32 = 1000;
const TITLE_HEIGHT: u32 = 64;
const LABEL_COLUMN: u32 = 220;
const RIGHT_MARGIN: u32 = 40;
const BAR_HEIGHT: u32 = 32;
const BAR_GAP: u32 = 14;
const BOTTOM_MARGIN: u32 = 24;
/// Bars longer than this share of the plot carry their label inside.
const INSIDE_LABEL_THRESHOLD: f64 = 0.20;
/// Headroom kept to the right of the longest bar.
const AXIS_HEADROOM: f64 = 1.05;
const FONT_FAMILY: &str = "'Segoe UI', 'SF Pro Display', sans-serif";
/// Reversed tab10 palette.
const PALETTE: [&str; 10] = [
    "#17becf", "#bcbd22", "#7f7f7f", "#e377c2", "#8c564b", "#9467bd", "#d62728", "#2ca02c",
    "#ff7f0e", "#1f77b4"
];

/// Display context a chart variant is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    /// Black labels for light backgrounds.
    Light,
    /// White labels for dark backgrounds.
    Dark
}

impl Theme {
    /// Every theme, in rendering order.
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    /// Label and title color.
    pub fn label_color(self) -> &'static str {
        match self {
            Self::Light => "#000000",
            Self::Dark => "#ffffff"
        }
    }

    /// File name of the rendered chart.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Light => "Light.svg",
            Self::Dark => "Dark.svg"
        }
    }
}

/// Renders a language distribution into an image file.
pub trait ChartRenderer {
    /// Writes the chart for `shares` (ascending order) to `path`.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::Io`] when the artifact cannot be
    /// written.
    fn render(
        &self,
        title: &str,
        shares: &[LanguageShare],
        theme: Theme,
        path: &Path
    ) -> Result<(), Error>;
}

/// SVG implementation of [`ChartRenderer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgBarChart;

impl ChartRenderer for SvgBarChart {
    fn render(
        &self,
        title: &str,
        shares: &[LanguageShare],
        theme: Theme,
        path: &Path
    ) -> Result<(), Error> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| error::io_error(parent, source))?;
        }

        let contents = build_svg_content(title, shares, theme);
        let file = File::create(path).map_err(|source| error::io_error(path, source))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(contents.as_bytes())
            .map_err(|source| error::io_error(path, source))?;
        writer
            .flush()
            .map_err(|source| error::io_error(path, source))
    }
}

fn build_svg_content(title: &str, shares: &[LanguageShare], theme: Theme) -> String {
    use std::fmt::Write as _;

    let rows = shares.len() as u32;
    let height = TITLE_HEIGHT + rows * (BAR_HEIGHT + BAR_GAP) + BOTTOM_MARGIN;
    let plot_width = f64::from(WIDTH - LABEL_COLUMN - RIGHT_MARGIN);
    let axis_max = shares
        .iter()
        .map(|share| share.fraction)
        .fold(0.0_f64, f64::max)
        * AXIS_HEADROOM;
    let color = theme.label_color();

    let mut buffer = String::with_capacity(512 + shares.len() * 384);
    let _ = writeln!(
        buffer,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" role=\"img\" aria-label=\"{title}\" width=\"{WIDTH}\" height=\"{height}\" viewBox=\"0 0 {WIDTH} {height}\">",
        title = escape_xml(title),
    );
    let _ = writeln!(
        buffer,
        "  <text x=\"{x}\" y=\"40\" text-anchor=\"middle\" font-family=\"{FONT_FAMILY}\" font-size=\"24\" font-weight=\"bold\" fill=\"{color}\">{title}</text>",
        x = WIDTH / 2,
        title = escape_xml(title),
    );

    // Largest share on top: walk the ascending list backwards.
    for (row, (index, share)) in shares.iter().enumerate().rev().enumerate() {
        let y = TITLE_HEIGHT + row as u32 * (BAR_HEIGHT + BAR_GAP);
        let center = f64::from(y) + f64::from(BAR_HEIGHT) / 2.0;
        let bar_width = if axis_max > 0.0 {
            share.fraction / axis_max * plot_width
        } else {
            0.0
        };
        let fill = PALETTE[index % PALETTE.len()];

        let _ = writeln!(
            buffer,
            "  <text x=\"{label_x}\" y=\"{center:.1}\" text-anchor=\"end\" dominant-baseline=\"middle\" font-family=\"{FONT_FAMILY}\" font-size=\"18\" font-weight=\"bold\" fill=\"{color}\">{name}</text>",
            label_x = LABEL_COLUMN - 12,
            name = escape_xml(&share.name),
        );
        let _ = writeln!(
            buffer,
            "  <rect x=\"{LABEL_COLUMN}\" y=\"{y}\" width=\"{bar_width:.1}\" height=\"{BAR_HEIGHT}\" fill=\"{fill}\"/>",
        );

        let (value_x, anchor) = if bar_width / plot_width > INSIDE_LABEL_THRESHOLD {
            (f64::from(LABEL_COLUMN) + bar_width / 2.0, "middle")
        } else {
            (f64::from(LABEL_COLUMN) + bar_width + 8.0, "start")
        };
        let _ = writeln!(
            buffer,
            "  <text x=\"{value_x:.1}\" y=\"{center:.1}\" text-anchor=\"{anchor}\" dominant-baseline=\"middle\" font-family=\"{FONT_FAMILY}\" font-size=\"16\" font-weight=\"bold\" fill=\"{color}\">{label}</text>",
            label = format_percentage(share.fraction),
        );
    }

    buffer.push_str("</svg>\n");
    buffer
}

fn format_percentage(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn escape_xml(value: &str) -> Cow<'_, str> {
    if value
        .chars()
        .any(|character| matches!(character, '&' | '<' | '>' | '\"' | '\''))
    {
        let mut escaped = String::with_capacity(value.len());
        for character in value.chars() {
            match character {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '\"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                other => escaped.push(other)
            }
        }
        Cow::Owned(escaped)
    } else {
        Cow::Borrowed(value)
    }
}
