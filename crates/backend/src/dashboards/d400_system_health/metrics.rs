//! Разбор метрик ОС из `/proc` (Linux). На других системах файлов нет,
//! и соответствующие поля остаются пустыми.

use contracts::dashboards::d400_system_health::{LoadAverage, MemoryInfo};

/// `/proc/loadavg`: "0.52 0.58 0.59 1/467 12345"
pub fn parse_loadavg(content: &str) -> Option<LoadAverage> {
    let mut parts = content.split_whitespace();
    let one = parts.next()?.parse().ok()?;
    let five = parts.next()?.parse().ok()?;
    let fifteen = parts.next()?.parse().ok()?;
    Some(LoadAverage { one, five, fifteen })
}

fn meminfo_kb(content: &str, key: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let rest = line.strip_prefix(key)?.strip_prefix(':')?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

/// `/proc/meminfo`; falls back to MemFree when MemAvailable is absent (old kernels)
pub fn parse_meminfo(content: &str) -> Option<MemoryInfo> {
    let total_kb = meminfo_kb(content, "MemTotal")?;
    if total_kb == 0 {
        return None;
    }
    let available_kb = meminfo_kb(content, "MemAvailable").or_else(|| meminfo_kb(content, "MemFree"))?;
    let used = total_kb.saturating_sub(available_kb) as f64;
    let used_percent = (used / total_kb as f64 * 1000.0).round() / 10.0;
    Some(MemoryInfo {
        total_kb,
        available_kb,
        used_percent,
    })
}

/// `/proc/uptime`: seconds since boot is the first number
pub fn parse_uptime(content: &str) -> Option<f64> {
    content.split_whitespace().next()?.parse().ok()
}

fn read_proc(file: &str) -> Option<String> {
    std::fs::read_to_string(format!("/proc/{}", file)).ok()
}

pub fn load_average() -> Option<LoadAverage> {
    read_proc("loadavg").as_deref().and_then(parse_loadavg)
}

pub fn memory() -> Option<MemoryInfo> {
    read_proc("meminfo").as_deref().and_then(parse_meminfo)
}

pub fn uptime_seconds() -> Option<f64> {
    read_proc("uptime").as_deref().and_then(parse_uptime)
}

/// "3d 4h 12m"
pub fn format_uptime(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else {
        format!("{}h {}m", hours, minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loadavg() {
        let load = parse_loadavg("0.52 0.58 1.25 1/467 12345\n").unwrap();
        assert_eq!(load.one, 0.52);
        assert_eq!(load.fifteen, 1.25);
        assert!(parse_loadavg("garbage").is_none());
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "MemTotal:        8000000 kB\nMemFree:          500000 kB\nMemAvailable:    2000000 kB\n";
        let mem = parse_meminfo(content).unwrap();
        assert_eq!(mem.total_kb, 8_000_000);
        assert_eq!(mem.available_kb, 2_000_000);
        assert_eq!(mem.used_percent, 75.0);

        let old = parse_meminfo("MemTotal: 1000 kB\nMemFree: 250 kB\n").unwrap();
        assert_eq!(old.available_kb, 250);
        assert!(parse_meminfo("MemFree: 250 kB\n").is_none());
    }

    #[test]
    fn test_uptime() {
        assert_eq!(parse_uptime("350735.47 234388.90"), Some(350735.47));
        assert_eq!(format_uptime(350735.47), "4d 1h 25m");
        assert_eq!(format_uptime(59.0), "0h 0m");
    }
}
