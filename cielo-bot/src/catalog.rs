//! Static configuration tables: webcams, METAR stations, and satellite maps.
//!
//! These mirror the deployed camera fleet and are immutable for the
//! lifetime of a run.

use crate::module::camera::{CameraSpec, CaptureStrategy};
use crate::module::report::StationSpec;
use crate::module::satellite::MapSpec;

pub const SATELLITE_START_URL: &str =
    "https://rammb.cira.colostate.edu/ramsdis/online/rmtc.asp#Central_and_South_America";

fn camera(
    name: &str,
    page_url: &str,
    base_url: Option<&str>,
    image_id: Option<&str>,
    strategy: CaptureStrategy,
) -> CameraSpec {
    CameraSpec {
        name: name.to_string(),
        page_url: page_url.to_string(),
        base_url: base_url.map(str::to_string),
        image_id: image_id.map(str::to_string),
        strategy,
    }
}

pub fn cameras() -> Vec<CameraSpec> {
    const OVSICORI: &str = "https://www.ovsicori.una.ac.cr";
    vec![
        camera(
            "Cartago",
            "https://cartagoenvivo.com/",
            Some("https://cartagoenvivo.com/"),
            Some("liveImage"),
            CaptureStrategy::StaticScrape,
        ),
        camera(
            "Volcan Turrialba",
            "https://www.ovsicori.una.ac.cr/index.php/vulcanologia/camara-volcanes-2/camara-v-turrialba",
            Some(OVSICORI),
            Some("camara"),
            CaptureStrategy::SimpleRender,
        ),
        camera(
            "Volcan Irazu",
            "https://www.ovsicori.una.ac.cr/index.php/vulcanologia/camara-volcanes-2/camara-2-v-turrialba",
            Some(OVSICORI),
            Some("camara"),
            CaptureStrategy::SimpleRender,
        ),
        // The Poas crater cameras usually serve a plain <img>, so they stay static.
        camera(
            "Poas Crater",
            "https://www.ovsicori.una.ac.cr/index.php/vulcanologia/camara-volcanes-2/camara-crater-v-poas",
            Some(OVSICORI),
            Some("camara"),
            CaptureStrategy::StaticScrape,
        ),
        camera(
            "Poas SO del Crater",
            "https://www.ovsicori.una.ac.cr/index.php/vulcanologia/camara-volcanes-2/camara-v-poas-so-del-crater",
            Some(OVSICORI),
            Some("camara"),
            CaptureStrategy::SimpleRender,
        ),
        camera(
            "Poas Chahuites",
            "https://www.ovsicori.una.ac.cr/index.php/vulcanologia/camara-volcanes-2/camara-v-poas-chahuites",
            Some(OVSICORI),
            Some("camara"),
            CaptureStrategy::StaticScrape,
        ),
        camera(
            "Rincon de la Vieja Sensoria",
            "https://www.ovsicori.una.ac.cr/index.php/vulcanologia/camara-volcanes-2/rincon-de-la-vieja-sensoria2",
            Some(OVSICORI),
            Some("camara"),
            CaptureStrategy::SimpleRender,
        ),
        camera(
            "Rincon de la Vieja Curubande",
            "https://www.ovsicori.una.ac.cr/index.php/vulcanologia/camara-volcanes-2/camara-v-rincon-de-la-vieja-curubande",
            Some(OVSICORI),
            Some("camara"),
            CaptureStrategy::StaticScrape,
        ),
        camera(
            "Rincon de la Vieja Gavilan",
            "https://www.ovsicori.una.ac.cr/index.php/vulcanologia/camara-volcanes-2/rincon-de-la-vieja-gavilan",
            Some(OVSICORI),
            Some("camara"),
            CaptureStrategy::StaticScrape,
        ),
        camera(
            "Reserva Karen Mogensen",
            "https://www.forestepersempre.org/fps/progetti/CostaRica/webcam/Karen-webcam.html",
            Some("https://www.forestepersempre.org"),
            Some("webcam"),
            CaptureStrategy::StaticScrape,
        ),
        camera(
            "Cobano Skyline",
            "https://www.skylinewebcams.com/webcam/costa-rica/puntarenas/puntarenas/cobano.html?w=4652",
            None,
            None,
            CaptureStrategy::InteractiveRender,
        ),
    ]
}

pub fn stations() -> Vec<StationSpec> {
    vec![
        StationSpec::new("MROC", "Juan Santamaría"),
        StationSpec::new("MRPV", "Tobías Bolaños"),
        StationSpec::new("MRLB", "Daniel Oduber"),
    ]
}

pub fn satellite_maps() -> Vec<MapSpec> {
    vec![
        MapSpec::new("rmtc/rmtccosvis1", "Animación Satelital (Visible) - Costa Rica"),
        MapSpec::new("rmtc/rmtccosvis2", "Animación Satelital (Infrarrojo) - Costa Rica"),
        MapSpec::new("rmtc/rmtccosir22", "Animación Satelital (Infrarrojo Onda Corta) - CR"),
        MapSpec::new("rmtc/rmtccosir42", "Animación Satelital (Vapor de Agua) - CR"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_camera_names_are_unique() {
        let cameras = cameras();
        let names: HashSet<_> = cameras.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), cameras.len());
    }

    #[test]
    fn test_scrape_and_simple_cameras_have_an_image_id() {
        for camera in cameras() {
            match camera.strategy {
                CaptureStrategy::StaticScrape | CaptureStrategy::SimpleRender => {
                    assert!(camera.image_id.is_some(), "camera '{}'", camera.name);
                }
                CaptureStrategy::InteractiveRender => {}
            }
        }
    }

    #[test]
    fn test_satellite_maps_are_ordered_and_distinct() {
        let maps = satellite_maps();
        assert_eq!(maps.len(), 4);
        let ids: HashSet<_> = maps.iter().map(|m| m.resource_id.as_str()).collect();
        assert_eq!(ids.len(), maps.len());
        assert_eq!(maps[0].resource_id, "rmtc/rmtccosvis1");
    }
}
