use crate::level2::VolumeHeader;

/// One data moment along a radial. `None` gates are below threshold or
/// range folded.
#[derive(Debug, Clone, PartialEq)]
pub struct Moment {
    pub first_gate_m: f32,
    pub gate_spacing_m: f32,
    pub gates: Vec<Option<f32>>,
}

impl Moment {
    pub fn valid(&self) -> impl Iterator<Item = f32> + '_ {
        self.gates.iter().filter_map(|g| *g)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Radial {
    /// Degrees clockwise from north.
    pub azimuth: f32,
    /// Measured antenna elevation in degrees.
    pub elevation: f32,
    /// 1-based cut index within the VCP.
    pub elevation_number: u8,
    pub velocity: Option<Moment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    pub number: u8,
    /// Nominal elevation of the cut in degrees.
    pub fixed_angle: f32,
    pub radials: Vec<Radial>,
}

/// Min, max and largest magnitude over a sweep's valid velocity gates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f32,
    pub max: f32,
    pub max_abs: f32,
}

impl Sweep {
    fn velocity_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.radials
            .iter()
            .filter_map(|r| r.velocity.as_ref())
            .flat_map(|m| m.valid())
    }

    /// True when at least one velocity gate is present and non-zero.
    pub fn has_velocity(&self) -> bool {
        self.velocity_values().any(|v| v != 0.0)
    }

    pub fn velocity_extent(&self) -> Option<Extent> {
        self.velocity_values().fold(None, |acc, v| {
            let Extent { min, max, max_abs } = acc.unwrap_or(Extent {
                min: v,
                max: v,
                max_abs: v.abs(),
            });
            Some(Extent {
                min: min.min(v),
                max: max.max(v),
                max_abs: max_abs.max(v.abs()),
            })
        })
    }
}

#[derive(Debug, Clone)]
pub struct Volume {
    pub header: VolumeHeader,
    /// Elevation of each VCP cut, indexed by `elevation_number - 1`.
    pub vcp_angles: Vec<f32>,
    pub sweeps: Vec<Sweep>,
}

impl Volume {
    /// Group radials into sweeps: a new sweep starts whenever the
    /// elevation number changes.
    pub fn assemble(header: VolumeHeader, vcp_angles: Vec<f32>, radials: Vec<Radial>) -> Self {
        let mut sweeps: Vec<Sweep> = Vec::new();

        for radial in radials {
            match sweeps.last_mut() {
                Some(sweep) if sweep.number == radial.elevation_number => sweep.radials.push(radial),
                _ => sweeps.push(Sweep {
                    number: radial.elevation_number,
                    fixed_angle: 0.0,
                    radials: vec![radial],
                }),
            }
        }

        for sweep in &mut sweeps {
            sweep.fixed_angle = (sweep.number as usize)
                .checked_sub(1)
                .and_then(|i| vcp_angles.get(i).copied())
                .unwrap_or_else(|| mean_elevation(&sweep.radials));
        }

        Self {
            header,
            vcp_angles,
            sweeps,
        }
    }
}

fn mean_elevation(radials: &[Radial]) -> f32 {
    if radials.is_empty() {
        return 0.0;
    }
    radials.iter().map(|r| r.elevation).sum::<f32>() / radials.len() as f32
}
