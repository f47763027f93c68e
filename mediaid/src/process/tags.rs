use std::collections::BTreeMap;

use crate::report::{CommentValue, Report};

/// Copies format comments into `tags`, keyed by tag family, and merges them
/// into the top-level `comments`.
///
/// Values are trimmed and empty ones dropped. Pictures are moved out of the
/// format sections into `comments.picture`.
pub fn process_tags(report: &mut Report) {
    let mut tags: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();
    let mut pictures = Vec::new();

    for (family, comments) in report.format_comments_mut() {
        if let Some(found) = comments.remove("picture") {
            pictures.extend(found);
        }
        for (key, values) in comments.iter() {
            let texts: Vec<String> = values
                .iter()
                .filter_map(CommentValue::as_text)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if !texts.is_empty() {
                tags.entry(family.to_string())
                    .or_default()
                    .entry(key.clone())
                    .or_default()
                    .extend(texts);
            }
        }
    }

    for (key, values) in tags.values().flat_map(|fields| fields.iter()) {
        let merged = report.comments.entry(key.clone()).or_default();
        for value in values {
            let value = CommentValue::Text(value.clone());
            if !merged.contains(&value) {
                merged.push(value);
            }
        }
    }
    if !pictures.is_empty() {
        report
            .comments
            .entry("picture".into())
            .or_default()
            .extend(pictures);
    }
    for (family, fields) in tags {
        report.tags.entry(family).or_default().extend(fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::cue::{CueSheet, tests::SHEET};
    use crate::formats::matroska::Matroska;
    use crate::report::{AttachmentData, Picture};

    #[test]
    fn families_are_kept_apart_and_pictures_move() {
        let mut mkv = Matroska::default();
        mkv.comments.insert(
            "title".into(),
            vec!["  Live  ".to_string().into(), "".to_string().into()],
        );
        mkv.comments.insert(
            "picture".into(),
            vec![CommentValue::Picture(Picture {
                data: AttachmentData::Inline(vec![1, 2, 3]),
                image_mime: "image/png".into(),
                filename: None,
                picturetype: None,
                description: None,
            })],
        );
        let (sheet, _) = CueSheet::parse(SHEET);
        let mut report = Report {
            matroska: Some(mkv),
            cue: Some(sheet),
            ..Default::default()
        };

        process_tags(&mut report);
        assert_eq!(report.tags["matroska"]["title"], ["Live"]);
        assert_eq!(report.tags["cue"]["title"], ["Live"]);
        assert_eq!(report.tags["cue"]["genre"], ["Rock"]);
        // Equal values from two families are merged once.
        assert_eq!(report.comments["title"], [CommentValue::Text("Live".into())]);
        assert_eq!(report.comments["picture"].len(), 1);
        assert!(!report.matroska.as_ref().unwrap().comments.contains_key("picture"));
    }
}
