use crate::{model::Dimensions, Result};

const RATIO_4_3: f64 = 4. / 3.;
const RATIO_16_9: f64 = 16. / 9.;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum AspectRatio {
    Ratio4x3,
    Ratio16x9,
}

impl AspectRatio {
    pub fn value(self) -> f64 {
        match self {
            AspectRatio::Ratio4x3 => RATIO_4_3,
            AspectRatio::Ratio16x9 => RATIO_16_9,
        }
    }

    /// Closest supported ratio to the viewport's long/short ratio.
    /// An exact tie goes to 4:3.
    pub fn closest_to(viewport: Dimensions) -> Result<Self> {
        let viewport = Dimensions::non_empty(viewport.width, viewport.height)?;
        let preview_ratio = viewport.long_short_ratio();
        if (preview_ratio - RATIO_4_3).abs() <= (preview_ratio - RATIO_16_9).abs() {
            Ok(AspectRatio::Ratio4x3)
        } else {
            Ok(AspectRatio::Ratio16x9)
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AspectRatio::Ratio4x3 => write!(f, "4:3"),
            AspectRatio::Ratio16x9 => write!(f, "16:9"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn working_resolution(self) -> Dimensions {
        match self {
            Orientation::Portrait => Dimensions::new(1080, 1920),
            Orientation::Landscape => Dimensions::new(1920, 1080),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    pub viewport: Dimensions,
    pub orientation: Orientation,
}

impl DisplayMetrics {
    pub fn new(viewport: Dimensions, orientation: Orientation) -> Self {
        Self {
            viewport,
            orientation,
        }
    }

    pub fn from_viewport(viewport: Dimensions) -> Self {
        let orientation = if viewport.width > viewport.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        Self::new(viewport, orientation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BindPlan {
    pub preview_ratio: AspectRatio,
    pub working_resolution: Dimensions,
}

pub fn select_bind_plan(metrics: &DisplayMetrics) -> Result<BindPlan> {
    let plan = BindPlan {
        preview_ratio: AspectRatio::closest_to(metrics.viewport)?,
        working_resolution: metrics.orientation.working_resolution(),
    };
    tracing::debug!(
        viewport = ?metrics.viewport,
        ratio = %plan.preview_ratio,
        resolution = ?plan.working_resolution,
        "selected capture plan"
    );
    Ok(plan)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;

    #[test]
    fn tall_phone_prefers_16_9() {
        // 2400 / 1080 = 2.22, 0.44 from 16:9 and 0.89 from 4:3
        let ratio = AspectRatio::closest_to(Dimensions::new(1080, 2400)).unwrap();
        assert_eq!(ratio, AspectRatio::Ratio16x9);
    }

    #[test]
    fn classic_viewport_prefers_4_3() {
        assert_eq!(
            AspectRatio::closest_to(Dimensions::new(480, 640)).unwrap(),
            AspectRatio::Ratio4x3
        );
        assert_eq!(
            AspectRatio::closest_to(Dimensions::new(640, 480)).unwrap(),
            AspectRatio::Ratio4x3
        );
    }

    #[test]
    fn square_viewport_goes_to_4_3() {
        assert_eq!(
            AspectRatio::closest_to(Dimensions::new(1000, 1000)).unwrap(),
            AspectRatio::Ratio4x3
        );
    }

    #[test]
    fn switch_point_sits_between_the_two_ratios() {
        // the midpoint of 4:3 and 16:9 is 14:9
        assert_eq!(
            AspectRatio::closest_to(Dimensions::new(900, 1390)).unwrap(),
            AspectRatio::Ratio4x3
        );
        assert_eq!(
            AspectRatio::closest_to(Dimensions::new(900, 1410)).unwrap(),
            AspectRatio::Ratio16x9
        );
    }

    #[test]
    fn empty_viewport_is_rejected() {
        assert!(matches!(
            AspectRatio::closest_to(Dimensions::new(0, 640)),
            Err(Error::DimensionError {
                width: 0,
                height: 640
            })
        ));
    }

    #[test]
    fn resolution_follows_orientation() {
        assert_eq!(
            Orientation::Portrait.working_resolution(),
            Dimensions::new(1080, 1920)
        );
        assert_eq!(
            Orientation::Landscape.working_resolution(),
            Dimensions::new(1920, 1080)
        );
        assert_eq!(
            DisplayMetrics::from_viewport(Dimensions::new(2400, 1080)).orientation,
            Orientation::Landscape
        );
    }

    #[test]
    fn bind_plan_combines_ratio_and_resolution() {
        let metrics = DisplayMetrics::new(Dimensions::new(1080, 2400), Orientation::Portrait);
        assert_eq!(
            select_bind_plan(&metrics).unwrap(),
            BindPlan {
                preview_ratio: AspectRatio::Ratio16x9,
                working_resolution: Dimensions::new(1080, 1920),
            }
        );
    }
}
