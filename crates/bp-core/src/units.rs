// bp-core/src/units.rs

use uom::si::f64::ThermodynamicTemperature as UomThermodynamicTemperature;
use uom::si::thermodynamic_temperature::{degree_fahrenheit, kelvin};

pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn k(v: f64) -> Temperature {
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn fahrenheit(v: f64) -> Temperature {
    Temperature::new::<degree_fahrenheit>(v)
}

pub mod constants {
    /// Pascals per pound-force per square inch, as used on the report.
    pub const PA_PER_PSI: f64 = 6894.76;
    /// Joules per BTU, as used on the report.
    pub const J_PER_BTU: f64 = 1055.06;
    /// Water at roughly room temperature; not density-corrected.
    pub const GPM_PER_KG_S: f64 = 15.85;
    pub const SECONDS_PER_HOUR: f64 = 3600.0;
}

use constants::*;

#[inline]
pub fn kelvin_to_fahrenheit(v: f64) -> f64 {
    k(v).get::<degree_fahrenheit>()
}

#[inline]
pub fn fahrenheit_to_kelvin(v: f64) -> f64 {
    fahrenheit(v).get::<kelvin>()
}

#[inline]
pub fn pascal_to_psi(pa: f64) -> f64 {
    pa / PA_PER_PSI
}

#[inline]
pub fn psi_to_pascal(psi: f64) -> f64 {
    psi * PA_PER_PSI
}

#[inline]
pub fn watts_to_kbtu_per_hour(w: f64) -> f64 {
    w * SECONDS_PER_HOUR / (1000.0 * J_PER_BTU)
}

#[inline]
pub fn kbtu_per_hour_to_watts(kbtu_h: f64) -> f64 {
    kbtu_h * 1000.0 * J_PER_BTU / SECONDS_PER_HOUR
}

#[inline]
pub fn kg_per_sec_to_gpm(m: f64) -> f64 {
    m * GPM_PER_KG_S
}

#[inline]
pub fn gpm_to_kg_per_sec(gpm: f64) -> f64 {
    gpm / GPM_PER_KG_S
}

/// Apply a scalar converter element-wise.
pub fn convert_all(values: &[f64], f: impl Fn(f64) -> f64) -> Vec<f64> {
    values.iter().map(|&v| f(v)).collect()
}

/// Physical quantity a stored series carries, which fixes how it is shown.
///
/// Series are stored in SI (or in whatever unit the model already emits for
/// `HeatRate`, `Percent`, `Speed` and `Dimensionless`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Quantity {
    /// Kelvin, shown in °F
    Temperature,
    /// Watts, shown in kBTU/h
    Power,
    /// Already kBTU/h
    HeatRate,
    /// kg/s of water, shown in GPM
    MassFlow,
    /// Pascal, shown in psi
    Pressure,
    /// 0..100
    Percent,
    /// RPM
    Speed,
    Dimensionless,
}

impl Quantity {
    /// Convert one stored value into display units.
    pub fn to_display(self, v: f64) -> f64 {
        match self {
            Self::Temperature => kelvin_to_fahrenheit(v),
            Self::Power => watts_to_kbtu_per_hour(v),
            Self::MassFlow => kg_per_sec_to_gpm(v),
            Self::Pressure => pascal_to_psi(v),
            Self::HeatRate | Self::Percent | Self::Speed | Self::Dimensionless => v,
        }
    }

    /// Vectorized form of [`Quantity::to_display`].
    pub fn to_display_all(self, values: &[f64]) -> Vec<f64> {
        convert_all(values, |v| self.to_display(v))
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            Self::Temperature => "°F",
            Self::Power | Self::HeatRate => "kBTU/h",
            Self::MassFlow => "GPM",
            Self::Pressure => "psi",
            Self::Percent => "%",
            Self::Speed => "RPM",
            Self::Dimensionless => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    const TOL: Tolerances = Tolerances {
        abs: 1e-9,
        rel: 1e-12,
    };

    #[test]
    fn temperature_constructors_agree() {
        let boiling = fahrenheit(212.0).get::<kelvin>();
        assert!(nearly_equal(k(373.15).get::<kelvin>(), boiling, TOL));
    }

    #[test]
    fn known_points() {
        assert!(nearly_equal(kelvin_to_fahrenheit(273.15), 32.0, TOL));
        assert!(nearly_equal(kelvin_to_fahrenheit(373.15), 212.0, TOL));
        assert!(nearly_equal(pascal_to_psi(6894.76), 1.0, TOL));
        assert!(nearly_equal(kg_per_sec_to_gpm(2.0), 31.7, TOL));
        // 1 kBTU/h is 1055.06 kJ per 3600 s
        assert!(nearly_equal(
            watts_to_kbtu_per_hour(1055.06 / 3.6),
            1.0,
            TOL
        ));
    }

    #[test]
    fn report_constants_close_to_uom() {
        use uom::si::energy::{btu_it, joule};
        use uom::si::f64::{Energy, Pressure};
        use uom::si::pressure::{pascal, psi};

        let loose = Tolerances {
            abs: 1e-6,
            rel: 1e-5,
        };
        for t_k in [250.0, 293.15, 355.37] {
            let by_formula = (t_k - 273.15) * 9.0 / 5.0 + 32.0;
            assert!(nearly_equal(kelvin_to_fahrenheit(t_k), by_formula, TOL));
        }
        let via_uom = Pressure::new::<pascal>(200_000.0).get::<psi>();
        assert!(nearly_equal(pascal_to_psi(200_000.0), via_uom, loose));
        // one hour at 25 kW
        let via_uom = Energy::new::<joule>(25_000.0 * SECONDS_PER_HOUR).get::<btu_it>() / 1000.0;
        assert!(nearly_equal(watts_to_kbtu_per_hour(25_000.0), via_uom, loose));
    }

    #[test]
    fn vectorized_matches_scalar() {
        let temps_k = [280.0, 300.0, 350.0];
        let f = Quantity::Temperature.to_display_all(&temps_k);
        for (kv, fv) in temps_k.iter().zip(&f) {
            assert_eq!(*fv, kelvin_to_fahrenheit(*kv));
        }
        let gpm = convert_all(&[0.0, 1.0], kg_per_sec_to_gpm);
        assert_eq!(gpm, vec![0.0, 15.85]);
    }

    #[test]
    fn pass_through_quantities() {
        assert_eq!(Quantity::Percent.to_display(42.0), 42.0);
        assert_eq!(Quantity::HeatRate.to_display(80.0), 80.0);
        assert_eq!(Quantity::Speed.unit_label(), "RPM");
    }
}
