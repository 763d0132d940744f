//! Writes a deterministic synthetic ObsCore dump for `maps-sio --dump`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use maps_sio::config::MAPS_SOURCES;

const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// ALMA receiver bands: (name, low GHz, high GHz).
const BANDS: [(&str, f64, f64); 4] = [
    ("3", 84.0, 116.0),
    ("4", 125.0, 163.0),
    ("6", 211.0, 275.0),
    ("7", 275.0, 373.0),
];

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

#[derive(Default)]
struct Columns {
    source: Vec<String>,
    project: Vec<String>,
    band: Vec<String>,
    em_min: Vec<f64>,
    em_max: Vec<f64>,
    resolution: Vec<Option<f64>>,
    mous: Vec<String>,
}

fn main() -> Result<()> {
    let batch = sample_batch(42)?;
    let output_path = Path::new("sample_obscore.parquet");
    write_parquet(output_path, &batch)?;

    println!(
        "Wrote {} ObsCore rows for {} sources to {}",
        batch.num_rows(),
        MAPS_SOURCES.len(),
        output_path.display()
    );
    Ok(())
}

/// Three MOUSes per source, four spectral windows each.
fn sample_batch(seed: u64) -> Result<RecordBatch> {
    let mut rng = SimpleRng::new(seed);
    let mut cols = Columns::default();
    let mut mous_no = 0u32;

    for (i, source) in MAPS_SOURCES.iter().enumerate() {
        let project = format!("2018.1.0{:04}.S", 1000 + i * 17);
        for _ in 0..3 {
            mous_no += 1;
            let mous = format!("uid://A001/X133d/X{mous_no:x}");
            let (band, lo, hi) = BANDS[rng.below(BANDS.len())];
            let resolution = if rng.next_f64() < 0.1 {
                None
            } else {
                Some(rng.range(0.03, 1.5))
            };

            // Four spectral windows per tuning, each 1.875 GHz wide.
            for _ in 0..4 {
                let f_min = rng.range(lo, hi - 1.875);
                let f_max = f_min + 1.875;
                cols.source.push(source.to_string());
                cols.project.push(project.clone());
                cols.band.push(band.to_string());
                cols.em_min.push(SPEED_OF_LIGHT_M_S / (f_max * 1e9));
                cols.em_max.push(SPEED_OF_LIGHT_M_S / (f_min * 1e9));
                cols.resolution.push(resolution);
                cols.mous.push(mous.clone());
            }
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Source", DataType::Utf8, false),
        Field::new("proposal_id", DataType::Utf8, false),
        Field::new("band_list", DataType::Utf8, false),
        Field::new("em_min", DataType::Float64, false),
        Field::new("em_max", DataType::Float64, false),
        Field::new("spatial_resolution", DataType::Float64, true),
        Field::new("member_ous_uid", DataType::Utf8, false),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(cols.source)),
            Arc::new(StringArray::from(cols.project)),
            Arc::new(StringArray::from(cols.band)),
            Arc::new(Float64Array::from(cols.em_min)),
            Arc::new(Float64Array::from(cols.em_max)),
            Arc::new(Float64Array::from(cols.resolution)),
            Arc::new(StringArray::from(cols.mous)),
        ],
    )
    .context("building record batch")
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
