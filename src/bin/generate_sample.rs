use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// City name with approximate coordinates.
const CITIES: [(&str, f64, f64); 6] = [
    ("Chennai, Tamil Nadu", 13.08, 80.27),
    ("Mumbai, Maharashtra", 19.08, 72.88),
    ("Delhi, Delhi", 28.70, 77.10),
    ("Pune, Maharashtra", 18.52, 73.86),
    ("Bangalore, Karnataka", 12.97, 77.59),
    ("Kolkata, West Bengal", 22.57, 88.36),
];
const MATERIALS: [&str; 5] = ["Steel", "Cement", "Auto parts", "Electronics", "Textiles"];
const SUPPLIERS: [&str; 6] = ["VIJSHAAR", "ANTRANPUN", "DMREXPCHE", "SRTLOGCHE", "GAUPRORAI", "KALTRAPUN"];
const VEHICLES: [&str; 4] = ["32 FT Multi-Axle", "24 FT SXL Container", "40 FT Trailer", "Tata Ace"];

const HEADERS: [&str; 12] = [
    "BookingID",
    "Origin_Location",
    "Destination_Location",
    "Material Shipped",
    "supplierNameCode",
    "vehicleType",
    "BookingID_Date",
    "Planned_ETA",
    "actual_eta",
    "TRANSPORTATION_DISTANCE_IN_KM",
    "Curr_lat",
    "Curr_lon",
];

fn distance_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    // Equirectangular approximation is plenty for sample data.
    let r = 6371.0;
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let x = (lon2 - lon1) * ((lat1 + lat2) / 2.0).cos();
    let y = lat2 - lat1;
    (x * x + y * y).sqrt() * r
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let start: NaiveDateTime = NaiveDate::from_ymd_opt(2023, 6, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let sheet = workbook.add_worksheet();

    for (col, name) in HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
        sheet.set_column_width(col as u16, 22)?;
    }

    let n_rows: u32 = 500;
    let mut late = 0usize;
    for i in 0..n_rows {
        let row = i + 1;
        let origin = *rng.pick(&CITIES);
        let destination = loop {
            let d = *rng.pick(&CITIES);
            if d.0 != origin.0 {
                break d;
            }
        };
        let km = distance_km((origin.1, origin.2), (destination.1, destination.2));
        let road_km = (km * 1.25 * 10.0).round() / 10.0;

        let booking = start
            + Duration::days(rng.below(365) as i64)
            + Duration::minutes(rng.below(24 * 60) as i64);
        let planned = booking + Duration::hours(((road_km / 45.0) as i64).max(6));

        // Longer hauls slip more; about one booking in six has no actual ETA yet.
        let delay = rng.gauss(road_km * 0.05 - 20.0, 60.0 + road_km * 0.04).round() as i64;
        let actual = (rng.next_f64() > 0.16).then(|| planned + Duration::minutes(delay));
        if actual.is_some() && delay > 0 {
            late += 1;
        }

        let progress = rng.next_f64();
        let lat = origin.1 + (destination.1 - origin.1) * progress;
        let lon = origin.2 + (destination.2 - origin.2) * progress;

        sheet.write_string(row, 0, format!("BKG{:06}", 100_000 + i))?;
        sheet.write_string(row, 1, origin.0)?;
        sheet.write_string(row, 2, destination.0)?;
        sheet.write_string(row, 3, *rng.pick(&MATERIALS))?;
        sheet.write_string(row, 4, *rng.pick(&SUPPLIERS))?;
        sheet.write_string(row, 5, *rng.pick(&VEHICLES))?;
        sheet.write_datetime_with_format(row, 6, &booking, &date_format)?;
        sheet.write_datetime_with_format(row, 7, &planned, &date_format)?;
        if let Some(actual) = actual {
            sheet.write_datetime_with_format(row, 8, &actual, &date_format)?;
        }
        sheet.write_number(row, 9, road_km)?;
        sheet.write_number(row, 10, (lat * 1e4).round() / 1e4)?;
        sheet.write_number(row, 11, (lon * 1e4).round() / 1e4)?;
    }

    let output_path = "sample_logistics.xlsx";
    workbook
        .save(output_path)
        .with_context(|| format!("writing {output_path}"))?;

    println!("Wrote {n_rows} shipments ({late} delayed) to {output_path}");
    Ok(())
}
