use crate::domain::model::{MeasureRow, RaceRow, RegistryEntry};
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use url::{Host, Url};

/// Second-level public suffixes that take two labels, e.g. `bbc.co.uk`.
const TWO_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "me.uk", "net.uk", "ltd.uk", "plc.uk", "com.au", "net.au",
    "org.au", "edu.au", "gov.au", "co.nz", "org.nz", "govt.nz", "co.jp", "ne.jp", "or.jp", "ac.jp",
    "go.jp", "co.kr", "or.kr", "com.br", "net.br", "org.br", "gov.br", "com.cn", "net.cn", "org.cn",
    "gov.cn", "com.tw", "org.tw", "edu.tw", "gov.tw", "com.hk", "org.hk", "co.in", "net.in",
    "org.in", "gov.in", "com.mx", "com.ar", "com.tr", "com.sg", "com.my", "co.za", "co.il", "co.id",
];

/// The registrable domain label of a URL: `www.example.co.uk` gives `example`.
///
/// IP hosts and single-label hosts (`localhost`) are returned as is. `None`
/// when the URL cannot be parsed or has no host.
pub fn registrable_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let domain = match parsed.host()? {
        Host::Ipv4(ip) => return Some(ip.to_string()),
        Host::Ipv6(ip) => return Some(ip.to_string()),
        Host::Domain(domain) => domain.trim_end_matches('.').to_ascii_lowercase(),
    };

    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    match labels.len() {
        0 => None,
        1 => Some(labels[0].to_string()),
        n => {
            let tail = format!("{}.{}", labels[n - 2], labels[n - 1]);
            let suffix_len = if TWO_LABEL_SUFFIXES.contains(&tail.as_str()) {
                2
            } else {
                1
            };
            if n > suffix_len {
                Some(labels[n - suffix_len - 1].to_string())
            } else {
                // 只有公共後綴本身，例如 "co.uk"
                Some(labels[0].to_string())
            }
        }
    }
}

pub fn measure_rows(entries: &[RegistryEntry]) -> Vec<MeasureRow> {
    entries
        .iter()
        .map(|entry| MeasureRow {
            url: entry.url.clone(),
            content_bytes: entry.content_bytes,
        })
        .collect()
}

/// Mean load time per registrable domain, in order of first appearance.
pub fn race_rows(entries: &[RegistryEntry]) -> Vec<RaceRow> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, (f64, usize)> = HashMap::new();

    for entry in entries {
        let Some(domain) = registrable_domain(&entry.url) else {
            tracing::warn!("Cannot determine domain of {}, skipping", entry.url);
            continue;
        };
        let slot = totals.entry(domain.clone()).or_insert_with(|| {
            order.push(domain);
            (0.0, 0)
        });
        slot.0 += entry.load_time_seconds;
        slot.1 += 1;
    }

    // 每個 domain 至少有一筆，不會除以零
    order
        .into_iter()
        .filter_map(|domain| {
            let (total, count) = totals.get(&domain).copied()?;
            Some(RaceRow {
                domain,
                average_load_time: total / count as f64,
            })
        })
        .collect()
}

/// Plain two-column table: left column padded, right column right-aligned.
pub fn render_table<K: AsRef<str>, V: AsRef<str>>(rows: &[(K, V)]) -> String {
    let key_width = rows.iter().map(|(k, _)| k.as_ref().chars().count()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, v)| v.as_ref().chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (key, value) in rows {
        out.push_str(&format!(
            "{:<kw$}  {:>vw$}\n",
            key.as_ref(),
            value.as_ref(),
            kw = key_width,
            vw = value_width
        ));
    }
    out
}

pub fn render_measure_table(rows: &[MeasureRow]) -> String {
    let cells: Vec<(&str, String)> = rows
        .iter()
        .map(|row| (row.url.as_str(), row.content_bytes.to_string()))
        .collect();
    render_table(&cells)
}

pub fn render_race_table(rows: &[RaceRow]) -> String {
    let cells: Vec<(&str, String)> = rows
        .iter()
        .map(|row| (row.domain.as_str(), row.average_load_time.to_string()))
        .collect();
    render_table(&cells)
}

pub fn render_json<T: Serialize>(rows: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(url: &str, load_time_seconds: f64) -> RegistryEntry {
        RegistryEntry {
            load_time_seconds,
            ..RegistryEntry::new(url)
        }
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("https://example.com").as_deref(), Some("example"));
        assert_eq!(registrable_domain("https://www.example.com/a/b").as_deref(), Some("example"));
        assert_eq!(registrable_domain("http://news.bbc.co.uk").as_deref(), Some("bbc"));
        assert_eq!(registrable_domain("https://EXAMPLE.org.").as_deref(), Some("example"));
        assert_eq!(registrable_domain("http://localhost:8080/").as_deref(), Some("localhost"));
        assert_eq!(registrable_domain("http://127.0.0.1:5000/x").as_deref(), Some("127.0.0.1"));
        assert_eq!(registrable_domain("not a url"), None);
    }

    #[test]
    fn test_race_rows_average_per_domain() {
        let entries = vec![
            timed("https://example.com", 1.0),
            timed("https://other.org", 0.5),
            timed("https://www.example.com/page", 3.0),
        ];

        let rows = race_rows(&entries);

        assert_eq!(
            rows,
            vec![
                RaceRow {
                    domain: "example".to_string(),
                    average_load_time: 2.0
                },
                RaceRow {
                    domain: "other".to_string(),
                    average_load_time: 0.5
                },
            ]
        );
    }

    #[test]
    fn test_race_rows_empty() {
        assert!(race_rows(&[]).is_empty());
    }

    #[test]
    fn test_measure_rows_keep_registry_order() {
        let entries = vec![
            RegistryEntry {
                content_bytes: 10,
                ..RegistryEntry::new("https://b.com")
            },
            RegistryEntry {
                content_bytes: 2000,
                ..RegistryEntry::new("https://a.com")
            },
        ];

        let table = render_measure_table(&measure_rows(&entries));
        assert_eq!(table, "https://b.com    10\nhttps://a.com  2000\n");
    }

    #[test]
    fn test_race_table_formatting() {
        let rows = vec![
            RaceRow {
                domain: "example".to_string(),
                average_load_time: 2.0,
            },
            RaceRow {
                domain: "rust-lang".to_string(),
                average_load_time: 0.25,
            },
        ];

        assert_eq!(render_race_table(&rows), "example       2\nrust-lang  0.25\n");
    }

    #[test]
    fn test_render_table_empty() {
        let rows: Vec<(String, String)> = Vec::new();
        assert_eq!(render_table(&rows), "");
    }

    #[test]
    fn test_render_json() {
        let rows = measure_rows(&[RegistryEntry {
            content_bytes: 500,
            ..RegistryEntry::new("https://example.com")
        }]);

        let json: serde_json::Value = serde_json::from_str(&render_json(&rows).unwrap()).unwrap();
        assert_eq!(json[0]["url"], "https://example.com");
        assert_eq!(json[0]["content_bytes"], 500);
    }
}
