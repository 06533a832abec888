//! Default logging setup for fixed table binaries.
//!
//! Every log line is prefixed with the time since [setup] was called and the current and peak
//! resident memory of the process, so memory growth (or the lack of it) is visible in the log.
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(missing_docs)]

use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

/// An amount of memory, displayed with a binary unit suffix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct MemoryAmount(pub usize);

impl fmt::Debug for MemoryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

impl fmt::Display for MemoryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 1000 {
            write!(f, "{:5}B", self.0)
        } else if self.0 < 1000 << 10 {
            write!(f, "{:5.1}K", self.0 as f64 / (1u64 << 10) as f64)
        } else if self.0 < 1000 << 20 {
            write!(f, "{:5.1}M", self.0 as f64 / (1u64 << 20) as f64)
        } else {
            write!(f, "{:5.1}G", self.0 as f64 / (1u64 << 30) as f64)
        }
    }
}

/// Resident memory of the current process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Resident set size right now.
    pub current: MemoryAmount,
    /// Largest resident set size so far.
    pub peak: MemoryAmount,
}

#[cfg(target_os = "linux")]
struct Statm {
    file: std::fs::File,
    buf: String,
    pagesize: usize,
}

#[cfg(target_os = "linux")]
thread_local! {
    static STATM: std::cell::RefCell<Option<Statm>> = const { std::cell::RefCell::new(None) };
}

#[cfg(all(unix, not(miri)))]
fn peak_rss() -> Option<usize> {
    // SAFETY: rusage is plain old data so all zeros is valid
    let mut rusage: libc::rusage = unsafe { std::mem::zeroed() };
    // SAFETY: getrusage is safe to call as long as it can safely write to the passed pointer
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut rusage) } < 0 {
        return None;
    }
    let maxrss = rusage.ru_maxrss as usize;
    // linux reports kilobytes, macos reports bytes
    Some(if cfg!(target_os = "macos") { maxrss } else { maxrss * 1024 })
}

#[cfg(not(all(unix, not(miri))))]
fn peak_rss() -> Option<usize> {
    None
}

#[cfg(all(target_os = "linux", not(miri)))]
fn current_rss() -> Option<usize> {
    use std::io::{Read, Seek};

    STATM.with_borrow_mut(|statm| {
        if statm.is_none() {
            *statm = Some(Statm {
                file: std::fs::File::open("/proc/self/statm").ok()?,
                buf: String::new(),
                // SAFETY: standard way to obtain page size
                pagesize: unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize },
            });
        }
        let statm = statm.as_mut()?;
        statm.file.seek(std::io::SeekFrom::Start(0)).ok()?;
        statm.buf.clear();
        statm.file.read_to_string(&mut statm.buf).ok()?;
        let pages = statm
            .buf
            .split_ascii_whitespace()
            .nth(1)?
            .parse::<usize>()
            .ok()?;
        Some(pages * statm.pagesize)
    })
}

#[cfg(not(all(target_os = "linux", not(miri))))]
fn current_rss() -> Option<usize> {
    peak_rss()
}

/// Returns the current and peak resident memory of this process.
///
/// Amounts that cannot be determined on the current platform are reported as zero.
pub fn memory_usage() -> MemoryUsage {
    MemoryUsage {
        current: MemoryAmount(current_rss().unwrap_or(0)),
        peak: MemoryAmount(peak_rss().unwrap_or(0)),
    }
}

const TIMESTAMP_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightBlack)));

const MEMORY_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Blue)));
const MEMORY_NEW_PEAK_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red)));
const MEMORY_PEAK_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightBlack)));

const TARGET_STYLE: anstyle::Style =
    anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Magenta)));

/// Environment variable holding the log filter, `info` if unset.
pub const FILTER_ENV: &str = "FIXED_TABLE_LOG";
/// Environment variable controlling colored output.
pub const STYLE_ENV: &str = "FIXED_TABLE_LOG_STYLE";

/// Performs the default logging setup used by fixed table binaries.
///
/// Panics if a global logger was already installed.
pub fn setup() {
    let start_time = std::time::Instant::now();
    let peak = AtomicUsize::new(memory_usage().peak.0);

    env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or(FILTER_ENV, "info")
            .write_style(STYLE_ENV),
    )
    .format(move |buf, record| {
        use std::io::Write;

        let timestamp = start_time.elapsed();
        let level = record.level();
        let MemoryUsage { current, peak: max } = memory_usage();
        let new_peak = peak.fetch_max(max.0, Ordering::Relaxed) < max.0;

        writeln!(
            buf,
            "{} {} {} {} {} {}",
            format_args!("{style}{timestamp:>9.2?}{style:#}", style = TIMESTAMP_STYLE),
            format_args!("{style}{current}{style:#}", style = MEMORY_STYLE),
            format_args!(
                "{style}{max}{style:#}",
                style = if new_peak {
                    MEMORY_NEW_PEAK_STYLE
                } else {
                    MEMORY_PEAK_STYLE
                }
            ),
            format_args!(
                "{style}{level:5}{style:#}",
                style = buf.default_level_style(level),
            ),
            format_args!("{style}{}{style:#}", record.target(), style = TARGET_STYLE),
            record.args(),
        )
    })
    .init();
}
