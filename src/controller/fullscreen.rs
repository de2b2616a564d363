// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Fullscreen transitions. Entering refits the active surface to the screen,
//! leaving restores the container it had before.

use crate::models::session::Session;

#[derive(Debug, Clone, Default)]
pub struct FullscreenState {
    saved_container: Option<(f64, f64)>,
}

impl FullscreenState {
    pub fn is_active(&self) -> bool {
        self.saved_container.is_some()
    }

    pub fn enter(&mut self, session: &mut Session, screen: (f64, f64)) -> bool {
        if self.is_active() {
            return false;
        }
        let previous = session.container();
        if !session.set_container(screen.0, screen.1) && session.container() != screen {
            log::warn!("Cannot enter fullscreen at {:?}", screen);
            return false;
        }
        self.saved_container = Some(previous);
        log::info!("Entered fullscreen at {:.0}x{:.0}", screen.0, screen.1);
        true
    }

    pub fn exit(&mut self, session: &mut Session) -> bool {
        let Some((w, h)) = self.saved_container.take() else {
            return false;
        };
        session.set_container(w, h);
        log::info!("Left fullscreen");
        true
    }

    pub fn toggle(&mut self, session: &mut Session, screen: (f64, f64)) -> bool {
        if self.is_active() {
            self.exit(session)
        } else {
            self.enter(session, screen)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::io::media::testing::MemoryLoader;
    use crate::models::factory::MarkerFactory;
    use crate::models::image::NewImage;
    use crate::models::marker::Point;
    use crate::models::palette::{MarkerColor, ShapeKind};

    #[test]
    fn test_roundtrip_restores_marker_positions() {
        let loader = MemoryLoader::default().with("mem://f", 800, 400);
        let mut s = Session::new(&Settings::default());
        s.add_image(NewImage {
            image_url: "mem://f".to_string(),
            description: String::new(),
            natural_size: (800, 400),
        });
        s.set_container(400.0, 400.0);
        s.switch_image(0, &loader);
        let m = MarkerFactory::default()
            .create(ShapeKind::Oval, MarkerColor::Blue, Point::new(100.0, 50.0), 200.0)
            .unwrap();
        s.add_marker(m);

        let mut fs = FullscreenState::default();
        assert!(fs.toggle(&mut s, (1600.0, 1000.0)));
        assert!(fs.is_active());
        assert_eq!(s.current_image().unwrap().space(), (1600.0, 800.0));
        assert!((s.current_image().unwrap().markers()[0].center().x - 400.0).abs() < 1e-6);

        assert!(fs.toggle(&mut s, (1600.0, 1000.0)));
        assert!(!fs.is_active());
        assert_eq!(s.container(), (400.0, 400.0));
        assert!((s.current_image().unwrap().markers()[0].center().x - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_bad_screen_is_rejected() {
        let mut s = Session::new(&Settings::default());
        let mut fs = FullscreenState::default();
        assert!(!fs.enter(&mut s, (0.0, 0.0)));
        assert!(!fs.exit(&mut s));
    }
}
