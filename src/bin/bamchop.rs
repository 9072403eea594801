//! bamchop CLI - chop a BAM index file into per-region pieces.
//!
//! Given a BAM file with an existing `.bai` or `.csi` index and a list of
//! regions, writes a small index file for each region to
//! `<prefix>/<region>/<index-file-name>`, creating the directories on demand.
//!
//! # Usage
//!
//! ```bash
//! # One small index per region (reference ids are numeric, begin is 1-based)
//! bamchop alignments.bam 0:1000000-2000000 1:500-90000
//!
//! # Regions listed one per line in a file
//! bamchop alignments.bam regions.txt
//!
//! # Keep the BAI linear index in the outputs, write under ./chopped
//! bamchop --linear --prefix chopped alignments.bam 0:1000000-2000000
//! ```

use std::env;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use bamchop::{chop_all, CropOptions, GenomicInterval, Index};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut prefix = PathBuf::from(".");
    let mut linear = false;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-p" | "--prefix" => {
                if i + 1 < args.len() {
                    prefix = PathBuf::from(&args[i + 1]);
                    i += 2;
                } else {
                    eprintln!("Error: --prefix requires a value");
                    process::exit(1);
                }
            }
            "-l" | "--linear" => {
                linear = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage();
                return;
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: unknown option {}", arg);
                print_usage();
                process::exit(1);
            }
            _ => {
                positional.push(args[i].clone());
                i += 1;
            }
        }
    }

    if positional.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let bamfile = PathBuf::from(&positional[0]);
    let mut regions: Vec<String> = positional[1..].to_vec();

    // A single argument that is not a region is a file listing regions.
    if regions.len() == 1 && parse_region(&regions[0]).is_none() {
        regions = match read_region_file(Path::new(&regions[0])) {
            Ok(lines) => lines,
            Err(e) => {
                eprintln!("Error: could not read region file {}: {}", regions[0], e);
                process::exit(1);
            }
        };
    }

    let mut intervals = Vec::with_capacity(regions.len());
    for region in &regions {
        match parse_region(region) {
            Some(interval) => intervals.push(interval),
            None => {
                eprintln!("Error: could not parse region '{}'", region);
                eprintln!("       Specify regions as REF:BEGIN-END with a numeric reference id.");
                process::exit(1);
            }
        }
    }

    let index_path = match find_index_file(&bamfile) {
        Some(path) => path,
        None => {
            eprintln!(
                "Error: could not find a .bai or .csi index for {}",
                bamfile.display()
            );
            process::exit(1);
        }
    };

    let index = match Index::from_path(&index_path) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("Error: could not load {}: {}", index_path.display(), e);
            process::exit(1);
        }
    };

    let index_name = index_path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("index"));

    let options = CropOptions {
        retain_linear_index: linear,
    };

    let result = chop_all(&index, &intervals, &options, |i, cropped| {
        let outdir = prefix.join(&regions[i]);
        fs::create_dir_all(&outdir)?;

        let outfile = outdir.join(&index_name);
        let mut writer = BufWriter::new(fs::File::create(&outfile)?);
        cropped.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    });

    if let Err(failure) = result {
        eprintln!("Error: {} (region '{}')", failure, regions[failure.interval]);
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("bamchop - chop a BAM index file into per-region pieces");
    eprintln!();
    eprintln!("Usage: bamchop [OPTIONS] BAM-FILE REGION...");
    eprintln!("       bamchop [OPTIONS] BAM-FILE REGION-FILE");
    eprintln!();
    eprintln!("Writes a small index file for each region, based on the existing .bai or");
    eprintln!(".csi index of BAM-FILE, to '<prefix>/<region>/<index-file-name>'.");
    eprintln!();
    eprintln!("Regions are REF:BEGIN-END with a numeric 0-based reference id and 1-based");
    eprintln!("coordinates, either on the command line or one per line in REGION-FILE.");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -p, --prefix DIR    Output prefix (default: current directory)");
    eprintln!("    -l, --linear        Include the BAI linear index in the output");
    eprintln!("    -h, --help          Show this help message");
}

/// Parse `REF:BEGIN-END` into an interval.
///
/// The command-line begin coordinate is 1-based and converted to the 0-based
/// internal convention (a literal 0 is accepted and kept).
fn parse_region(region: &str) -> Option<GenomicInterval> {
    let (ref_part, range) = region.split_once(':')?;
    let (begin_part, end_part) = range.split_once('-')?;

    let ref_id: usize = ref_part.parse().ok()?;
    let mut begin: u64 = begin_part.parse().ok()?;
    let end: u64 = end_part.parse().ok()?;

    if begin != 0 {
        begin -= 1;
    }
    if begin >= end {
        return None;
    }

    Some(GenomicInterval::new(ref_id, begin, end))
}

/// Locate the index for a BAM file: `<path>.bai`, `<path-minus-ext>.bai`,
/// then the same two patterns with `.csi`.
fn find_index_file(bamfile: &Path) -> Option<PathBuf> {
    for ext in ["bai", "csi"] {
        let mut appended = bamfile.as_os_str().to_owned();
        appended.push(".");
        appended.push(ext);
        let appended = PathBuf::from(appended);
        if appended.is_file() {
            return Some(appended);
        }

        if bamfile.extension().is_some() {
            let replaced = bamfile.with_extension(ext);
            if replaced.is_file() {
                return Some(replaced);
            }
        }
    }
    None
}

fn read_region_file(path: &Path) -> std::io::Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
