use std::fs::File;
use std::io::Write;
use std::path::Path;

use limitup_models::quote::TabularRecord;
use tracing::info;

use crate::analyzer::ScreenKind;
use crate::error::MarketError;

/// UTF-8 byte order mark, so spreadsheet tools detect the encoding of the Chinese headers.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// `{stem}_{date}.csv`, e.g. `limit_up_stocks_20241220.csv`.
pub fn csv_file_name(kind: ScreenKind, trade_date: &str) -> String {
    format!("{}_{}.csv", kind.file_stem(), trade_date)
}

/// Write records with a BOM and a header row. Returns the rows written.
///
/// Nothing is written for an empty table.
pub fn write_csv<T: TabularRecord>(path: &Path, records: &[T]) -> Result<usize, MarketError> {
    let Some(first) = records.first() else {
        return Ok(0);
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(first.headers())?;
    for record in records {
        writer.write_record(record.cells())?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "Wrote CSV");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use limitup_models::quote::QuoteRecord;

    fn record(code: &str, name: &str) -> QuoteRecord {
        QuoteRecord {
            ts_code: code.to_string(),
            name: name.to_string(),
            close: 11.0,
            pct_chg: 10.0,
            vol: 1000.0,
            amount: 500000.0,
        }
    }

    #[test]
    fn file_name_includes_stem_and_date() {
        assert_eq!(
            csv_file_name(ScreenKind::HighVolumeHighDecline, "20241220"),
            "high_volume_high_decline_20241220.csv"
        );
    }

    #[test]
    fn writes_bom_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("limit_up_stocks_20241220.csv");

        let written = write_csv(&path, &[record("000001.SZ", "平安银行"), record("000002.SZ", "万科A")]).unwrap();
        assert_eq!(written, 2);

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "股票代码,股票名称,收盘价,涨跌幅(%),成交量(手),成交额(千元)");
        assert_eq!(lines[1], "000001.SZ,平安银行,11,10,1000,500000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_table_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let written = write_csv::<QuoteRecord>(&path, &[]).unwrap();
        assert_eq!(written, 0);
        assert!(!path.exists());
    }
}
