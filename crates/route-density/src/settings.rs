use clap::Parser;
use route_density_lib::{ClassifierConfig, DEFAULT_PRECISION, MergeConfig};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Route Density - merge route segments and classify trip density
pub struct Settings {
    /// JSON file with an array of segment records (`-` reads stdin)
    #[clap(value_name = "FILE")]
    pub input: PathBuf,

    /// Write the result here instead of stdout
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Chain connected segments into super-segments instead of classifying them
    #[clap(short, long, default_value = "false")]
    pub merge: bool,

    /// With --merge, also classify the super-segments by their busiest member
    /// (without --merge the input segments are classified anyway)
    #[clap(short, long, default_value = "false")]
    pub classify: bool,

    /// Decimal places endpoints are rounded to when merging
    #[clap(short, long, default_value_t = DEFAULT_PRECISION)]
    pub precision: u32,

    /// Keep only segments whose count reaches this percentile (e.g. 99 for the top 1%)
    #[clap(long, value_name = "PERCENTILE")]
    pub top_percentile: Option<f64>,

    /// Count used for missing values when filtering by --top-percentile
    #[clap(long, default_value = "0")]
    pub filter_fill_count: u64,

    /// Percentile cutpoints bounding the colour buckets
    #[clap(long, value_delimiter = ',', default_value = "60,80,95,99,99.5,99.95")]
    pub cutpoints: Vec<f64>,

    /// Count used for segments without one when classifying
    #[clap(long, default_value = "1")]
    pub fill_count: u64,

    /// Percentage used for segments without one when classifying
    #[clap(long, default_value = "1.0")]
    pub fill_percentage: f64,

    /// Line width of the smallest percentage
    #[clap(long, default_value = "4.0")]
    pub width_min: f64,

    /// Line width of the largest percentage
    #[clap(long, default_value = "12.0")]
    pub width_max: f64,

    /// Include min/quartiles/max of the trip counts in the output
    #[clap(long, default_value = "false")]
    pub summary: bool,

    /// Pretty-print the JSON output
    #[clap(long, default_value = "false")]
    pub pretty: bool,
}

impl Settings {
    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            precision: self.precision,
        }
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            cutpoints: self.cutpoints.clone(),
            fill_count: self.fill_count,
            fill_percentage: self.fill_percentage,
            width_min: self.width_min,
            width_max: self.width_max,
        }
    }
}
