//! Line/word reconstruction and text rendering.
//!
//! Glyphs are bucketed into visual lines by `top`, ordered by `x0` within a
//! line, then walked once: a bucket change is a line break, a horizontal gap
//! above the word threshold is a word break.

use crate::clustering::cluster_ids;
use crate::objects::Glyph;

use super::types::{TextSettings, Word};

/// A reconstructed visual line: runs of glyphs separated by word breaks.
struct TextLine<'a> {
    runs: Vec<Vec<&'a Glyph>>,
}

/// Order glyphs into lines and runs.
fn reconstruct_lines<'a>(glyphs: &[&'a Glyph], settings: &TextSettings) -> Vec<TextLine<'a>> {
    if glyphs.is_empty() {
        return Vec::new();
    }
    let tops: Vec<f64> = glyphs.iter().map(|g| g.bbox.top()).collect();
    let buckets = cluster_ids(&tops, settings.y_tolerance);

    // sort_by is stable: ties keep input order
    let mut order: Vec<usize> = (0..glyphs.len()).collect();
    order.sort_by(|&a, &b| {
        buckets[a]
            .cmp(&buckets[b])
            .then(glyphs[a].bbox.x0().total_cmp(&glyphs[b].bbox.x0()))
    });

    let mut lines: Vec<TextLine<'a>> = Vec::new();
    let mut prev: Option<usize> = None;
    for idx in order {
        let glyph = glyphs[idx];
        let same_line = prev.filter(|&p| buckets[p] == buckets[idx]);
        if let (Some(p), Some(line)) = (same_line, lines.last_mut()) {
            let prev_glyph = glyphs[p];
            let gap = glyph.bbox.x0() - prev_glyph.bbox.x1();
            if gap > settings.word_gap_threshold(prev_glyph) {
                line.runs.push(vec![glyph]);
            } else if let Some(run) = line.runs.last_mut() {
                run.push(glyph);
            }
        } else {
            lines.push(TextLine {
                runs: vec![vec![glyph]],
            });
        }
        prev = Some(idx);
    }
    lines
}

/// Expand ligature characters to their component characters.
fn expand_ligature(text: &str, expand: bool) -> &str {
    if !expand {
        return text;
    }
    match text {
        "\u{fb00}" => "ff",
        "\u{fb01}" => "fi",
        "\u{fb02}" => "fl",
        "\u{fb03}" => "ffi",
        "\u{fb04}" => "ffl",
        "\u{fb05}" | "\u{fb06}" => "st",
        _ => text,
    }
}

/// Merge an ordered run of glyphs into a word.
fn merge_chars(ordered: &[&Glyph], settings: &TextSettings) -> Word {
    let first = ordered[0];
    let bbox = ordered
        .iter()
        .skip(1)
        .fold(first.bbox, |acc, g| acc.union(&g.bbox));
    let doctop_adj = first.doctop - first.bbox.top();
    let text = ordered
        .iter()
        .map(|g| expand_ligature(&g.text, settings.expand_ligatures))
        .collect::<String>();
    Word {
        text,
        bbox,
        doctop: bbox.top() + doctop_adj,
        upright: first.upright,
        chars: ordered.iter().map(|g| (*g).clone()).collect(),
    }
}

/// Split a run at blank glyphs unless blanks are kept.
fn split_run<'a, 'r>(
    run: &'r [&'a Glyph],
    settings: &TextSettings,
) -> impl Iterator<Item = &'r [&'a Glyph]> {
    let keep_blank = settings.keep_blank_chars;
    run.split(move |g| !keep_blank && g.is_blank())
        .filter(|piece| !piece.is_empty())
}

/// Render text from glyph references.
pub fn extract_text_from_refs(glyphs: &[&Glyph], settings: &TextSettings) -> String {
    let lines = reconstruct_lines(glyphs, settings);
    let mut out = String::new();
    for (line_idx, line) in lines.iter().enumerate() {
        if line_idx > 0 {
            out.push('\n');
        }
        for (run_idx, run) in line.runs.iter().enumerate() {
            if run_idx > 0 {
                out.push(' ');
            }
            for glyph in run {
                out.push_str(expand_ligature(&glyph.text, settings.expand_ligatures));
            }
        }
    }
    out
}

/// Extract words from glyph references.
pub fn extract_words_from_refs(glyphs: &[&Glyph], settings: &TextSettings) -> Vec<Word> {
    let lines = reconstruct_lines(glyphs, settings);
    let mut words = Vec::new();
    for line in &lines {
        for run in &line.runs {
            words.extend(split_run(run, settings).map(|piece| merge_chars(piece, settings)));
        }
    }
    words
}

/// Render glyphs as display text: `\n` between lines, `" "` between words.
pub fn extract_text(glyphs: &[Glyph], settings: &TextSettings) -> String {
    let refs: Vec<&Glyph> = glyphs.iter().collect();
    extract_text_from_refs(&refs, settings)
}

/// Group glyphs into words, in reading order.
pub fn extract_words(glyphs: &[Glyph], settings: &TextSettings) -> Vec<Word> {
    let refs: Vec<&Glyph> = glyphs.iter().collect();
    extract_words_from_refs(&refs, settings)
}
