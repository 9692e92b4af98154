use serde_json::json;
use shctx::{decode_record, enrich_batch, rank, stripped, DistParams};

fn line(cmd: &str, pwd: &str, before: f64, cols: serde_json::Value) -> String {
    json!({
        "cmdLine": cmd,
        "sessionId": "s1",
        "machineId": "m1",
        "pwd": pwd,
        "pwdAfter": pwd,
        "realPwd": pwd,
        "realPwdAfter": pwd,
        "realtimeBefore": before,
        "realtimeAfter": before + 1.0,
        "realtimeBeforeLocal": before,
        "realtimeAfterLocal": before + 1.0,
        "cols": cols,
        "lines": cols
    })
    .to_string()
}

#[test]
fn decode_enrich_and_rank_history() -> shctx::Result<()> {
    let lines = [
        line("make -j8", "/src/app", 1000.0, json!(80)),
        line("ls", "/tmp", 1000.0, json!("80")),
        line("CC=clang make", "/src/app", 2000.0, json!("120")),
    ];
    let records = lines
        .iter()
        .map(|l| decode_record(l.as_bytes()))
        .collect::<shctx::Result<Vec<_>>>()?;
    assert_eq!(records[0].cols, "80");

    let history = enrich_batch(records);
    assert!(history.iter().all(|r| !r.invalid));
    assert_eq!(history[2].command, "make");
    assert!(history[2].last_record_of_session);

    let query = stripped(&history[2]);
    let ranked = rank(&query, &history, &DistParams::default());

    // the query's own source record is the closest match
    assert!(std::ptr::eq(ranked[0].record, &history[2]));
    assert_eq!(ranked[0].distance, 0.0);
    assert_eq!(ranked.last().map(|r| r.record.command.as_str()), Some("ls"));
    Ok(())
}
