// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Read-only projections of marker state for the cost calculation.

use super::image::{ImageRecord, Jaw};
use super::palette::{MarkerColor, MarkerType};
use super::session::Session;
use std::collections::BTreeMap;

/// Presence of a color in the upper and lower jaw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JawSplit {
    pub top_units: u32,
    pub bottom_units: u32,
}

fn calculation_images(session: &Session) -> impl Iterator<Item = &ImageRecord> {
    session.images().iter().filter(|i| i.used_in_calculations)
}

/// Per-type marker counts over the images flagged for calculation.
///
/// Every marker type is present in the result, with zero for unused ones.
pub fn counts_for_calculation(session: &Session) -> BTreeMap<MarkerType, usize> {
    let mut counts: BTreeMap<MarkerType, usize> = MarkerType::all().map(|t| (t, 0)).collect();
    for image in calculation_images(session) {
        for marker in image.markers() {
            *counts.entry(marker.marker_type).or_default() += 1;
        }
    }
    counts
}

/// Per-color upper/lower presence over the images flagged for calculation.
///
/// A jaw-tagged image sends all of its markers to that jaw. Otherwise a
/// marker whose center lies above the image's midline counts as top.
pub fn jaw_splits_for_calculation(session: &Session) -> BTreeMap<MarkerColor, JawSplit> {
    let mut splits: BTreeMap<MarkerColor, JawSplit> = MarkerColor::ALL
        .iter()
        .map(|&c| (c, JawSplit::default()))
        .collect();

    for image in calculation_images(session) {
        let midline = image.midline_y();
        for marker in image.markers() {
            let top = match image.jaw {
                Some(Jaw::Upper) => true,
                Some(Jaw::Lower) => false,
                None => marker.center().y < midline,
            };
            let split = splits.entry(marker.marker_type.color).or_default();
            if top {
                split.top_units = 1;
            } else {
                split.bottom_units = 1;
            }
        }
    }
    splits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::io::media::testing::MemoryLoader;
    use crate::models::factory::MarkerFactory;
    use crate::models::image::{NewImage, WorkMode};
    use crate::models::marker::Point;
    use crate::models::palette::ShapeKind;

    fn session(mode: WorkMode, count: usize) -> (Session, MemoryLoader) {
        let mut s = Session::new(&Settings::default());
        s.set_work_mode(mode);
        let mut loader = MemoryLoader::default();
        for i in 0..count {
            let url = format!("mem://{}", i);
            loader = loader.with(&url, 1000, 700);
            s.add_image(NewImage {
                image_url: url,
                description: String::new(),
                natural_size: (1000, 700),
            });
        }
        (s, loader)
    }

    fn mark(s: &mut Session, color: MarkerColor, shape: ShapeKind, at: Point) {
        let h = s.current_image().unwrap().space().1;
        let m = MarkerFactory::default().create(shape, color, at, h).unwrap();
        s.add_marker(m).unwrap();
    }

    #[test]
    fn test_counts_ignore_reference_images() {
        let (mut s, loader) = session(WorkMode::Simple, 4);
        for i in 0..4 {
            s.switch_image(i, &loader);
            mark(&mut s, MarkerColor::Blue, ShapeKind::Point, Point::new(50.0, 50.0));
        }
        let counts = counts_for_calculation(&s);
        let blue_dot = "blue_dot".parse::<MarkerType>().unwrap();
        assert_eq!(counts[&blue_dot], 2);
        assert!(!s.images()[2].used_in_calculations);
        assert!(!s.images()[3].used_in_calculations);
    }

    #[test]
    fn test_counts_panoramic_first_only() {
        let (mut s, loader) = session(WorkMode::Panoramic, 2);
        s.switch_image(0, &loader);
        mark(&mut s, MarkerColor::Red, ShapeKind::Cross, Point::new(10.0, 10.0));
        mark(&mut s, MarkerColor::Red, ShapeKind::Cross, Point::new(20.0, 10.0));
        s.switch_image(1, &loader);
        mark(&mut s, MarkerColor::Red, ShapeKind::Cross, Point::new(10.0, 10.0));

        let counts = counts_for_calculation(&s);
        assert_eq!(counts[&"red_cross".parse::<MarkerType>().unwrap()], 2);
        assert_eq!(counts[&"white_dot".parse::<MarkerType>().unwrap()], 0);
    }

    #[test]
    fn test_midline_split() {
        let (mut s, loader) = session(WorkMode::Panoramic, 1);
        s.switch_image(0, &loader);
        let (_, h) = s.current_image().unwrap().space();

        mark(&mut s, MarkerColor::Yellow, ShapeKind::Line, Point::new(100.0, h * 0.1));
        let splits = jaw_splits_for_calculation(&s);
        assert_eq!(
            splits[&MarkerColor::Yellow],
            JawSplit {
                top_units: 1,
                bottom_units: 0
            }
        );
        assert_eq!(splits[&MarkerColor::Green], JawSplit::default());

        s.undo();
        mark(&mut s, MarkerColor::Yellow, ShapeKind::Line, Point::new(100.0, h * 0.8));
        let splits = jaw_splits_for_calculation(&s);
        assert_eq!(
            splits[&MarkerColor::Yellow],
            JawSplit {
                top_units: 0,
                bottom_units: 1
            }
        );
    }

    #[test]
    fn test_jaw_tag_overrides_midline() {
        let (mut s, loader) = session(WorkMode::Simple, 2);
        s.switch_image(1, &loader);
        mark(&mut s, MarkerColor::Violet, ShapeKind::Point, Point::new(10.0, 1.0));
        let splits = jaw_splits_for_calculation(&s);
        assert_eq!(splits[&MarkerColor::Violet].top_units, 0);
        assert_eq!(splits[&MarkerColor::Violet].bottom_units, 1);
    }
}
