// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Text folding helpers: whitespace, transliteration and punctuation.

/// Characters removed from free text before comparison.
const PUNCTUATION: &[char] = &['"', '\'', '-', '_', ':', ',', ';', '.', '!', '?', '&', '+'];

/// Multi-letter replacements, applied before the single-letter table.
const LIGATURES: &[(&str, &str)] = &[
    ("ÄÆäæǼǽ", "ae"),
    ("ÖöŒœ", "oe"),
    ("Üü", "ue"),
    ("ß", "ss"),
    ("Ĳĳ", "ij"),
];

/// Latin letters with diacritics, grouped by their ASCII base.
const DIACRITICS: &[(&str, char)] = &[
    ("ÂÁÀÃÅâáàãåĀāĂăĄąǺǻ", 'a'),
    ("ÊÉÈËèéêëĒēĔĕĖėĘęĚě", 'e'),
    ("ÌÍÎÏìíîïĨĩĪīĬĭĮįİı", 'i'),
    ("ÕØÒÓÔòóôõøŌōŎŏŐőǾǿ", 'o'),
    ("ÙÚÛùúûŨũŪūŬŭŮůŰűŲųơƯư", 'u'),
    ("ÝýÿŶŷŸ", 'y'),
    ("ÇçĆćĈĉĊċČč", 'c'),
    ("ÐðĎďĐđ", 'd'),
    ("ĜĝĞğĠġĢģ", 'g'),
    ("ĤĥĦħ", 'h'),
    ("Ĵĵ", 'j'),
    ("Ķķĸ", 'k'),
    ("ĹĺĻļĽľĿŀŁł", 'l'),
    ("ÑñŃńŅņŇňŉŊŋ", 'n'),
    ("ŔŕŖŗŘř", 'r'),
    ("ŚśŜŝŞşŠš", 's'),
    ("ŢţŤťŦŧ", 't'),
    ("Ŵŵ", 'w'),
    ("ŹźŻżŽž", 'z'),
];

/// Replaces every whitespace run with one space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Folds accented letters and ligatures to their ASCII spelling.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if let Some((_, repl)) = LIGATURES.iter().find(|(from, _)| from.contains(c)) {
            out.push_str(repl);
        } else if let Some((_, base)) = DIACRITICS.iter().find(|(from, _)| from.contains(c)) {
            out.push(*base);
        } else {
            out.push(c);
        }
    }
    out
}

/// Removes quotes, dashes and other punctuation.
pub fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|c| !PUNCTUATION.contains(c)).collect()
}
