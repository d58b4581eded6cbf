use std::{io, sync::Arc};

use inference::testing::Fixture;
use serde_json::json;
use tokio::io::{self as tokio_io, AsyncReadExt, AsyncWriteExt};

use serving::{
    ModelEntry, Registry, Service,
    catalog::ModelList,
    health::Health,
    protocol::{Request, Response},
    query::{BatchPredictions, Comparison, ReactionConditions, TimeSeries, TimeSweep},
    transport,
};

const BUF_SIZE: usize = 1 << 20;

const REFERENCE: ReactionConditions = ReactionConditions {
    m_molar: 3.326,
    s_molar: 6.674,
    i_molar: 0.0246,
    temperature_k: 333.0,
    time_s: 7200.0,
};

fn service() -> Service {
    let entries: Vec<_> = ModelEntry::defaults()
        .into_iter()
        .map(|e| {
            let p = Fixture::monotone(&e.name).predictor();
            (e, p)
        })
        .collect();

    let registry = Registry::from_predictors(entries, "sa_pcinn", 3).unwrap();
    Service::new(Arc::new(registry))
}

fn sweep(steps: usize) -> TimeSweep {
    TimeSweep {
        m_molar: 3.326,
        s_molar: 6.674,
        i_molar: 0.0246,
        temperature_k: 333.0,
        time_start_s: 0.0,
        time_end_s: 18000.0,
        time_steps: steps,
    }
}

#[tokio::test]
async fn one_connection_serves_many_requests() -> io::Result<()> {
    let (client, server) = tokio_io::duplex(BUF_SIZE);
    let service = service();

    let server_task = tokio::spawn(async move {
        let (rx, tx) = tokio_io::split(server);
        transport::serve(rx, tx, &service).await
    });

    let (mut rx, mut tx) = tokio_io::split(client);

    let resp = transport::call(&mut rx, &mut tx, &Request::Health).await?;
    assert_eq!(resp.status, 200);
    let health: Health = serde_json::from_value(resp.body)?;
    assert_eq!(health.models_loaded, 3);

    let resp = transport::call(&mut rx, &mut tx, &Request::Models).await?;
    let list: ModelList = serde_json::from_value(resp.body)?;
    assert_eq!(list.models.len(), 3);

    let req = Request::PredictBatch {
        model: Some("pcinn".into()),
        inputs: vec![REFERENCE; 25],
    };
    let resp = transport::call(&mut rx, &mut tx, &req).await?;
    assert_eq!(resp.status, 200);
    let batch: BatchPredictions = serde_json::from_value(resp.body)?;
    assert_eq!(batch.predictions.len(), 25);

    let req = Request::PredictTimeseries {
        model: None,
        sweep: sweep(100),
    };
    let resp = transport::call(&mut rx, &mut tx, &req).await?;
    let series: TimeSeries = serde_json::from_value(resp.body)?;
    assert_eq!(series.times.len(), 100);
    assert_eq!(series.series.mw.len(), 100);

    let req = Request::PredictCompare { sweep: sweep(20) };
    let resp = transport::call(&mut rx, &mut tx, &req).await?;
    let cmp: Comparison = serde_json::from_value(resp.body)?;
    assert_eq!(cmp.models.len(), 3);
    assert!(cmp.models.values().all(|s| s.len() == 20));

    drop(tx);
    drop(rx);
    server_task.await??;
    Ok(())
}

#[tokio::test]
async fn errors_do_not_close_the_connection() -> io::Result<()> {
    let (client, server) = tokio_io::duplex(BUF_SIZE);
    let service = service();

    let server_task = tokio::spawn(async move {
        let (rx, tx) = tokio_io::split(server);
        transport::serve(rx, tx, &service).await
    });

    let (mut rx, mut tx) = tokio_io::split(client);

    let bad = ReactionConditions {
        i_molar: 0.5,
        ..REFERENCE
    };
    let resp = transport::call(&mut rx, &mut tx, &Request::Predict { model: None, input: bad }).await?;
    assert_eq!(resp.status, 422);
    assert_eq!(resp.body["field"], "i_molar");

    let req = Request::Predict {
        model: Some("nonexistent".into()),
        input: REFERENCE,
    };
    let resp = transport::call(&mut rx, &mut tx, &req).await?;
    assert_eq!(resp.status, 400);

    // Raw garbage in a well formed frame.
    transport::write_frame(b"[1, 2, 3]", &mut tx).await?;
    let mut buf = Vec::new();
    assert!(transport::read_frame(&mut rx, &mut buf).await?);
    let resp: Response = serde_json::from_slice(&buf)?;
    assert_eq!(resp.status, 422);

    let resp = transport::call(&mut rx, &mut tx, &Request::Ready).await?;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!({ "status": "ready" }));

    drop(tx);
    drop(rx);
    server_task.await??;
    Ok(())
}

#[tokio::test]
async fn oversized_frame_closes_the_connection() -> io::Result<()> {
    let (mut client, server) = tokio_io::duplex(BUF_SIZE);
    let service = service();

    let server_task = tokio::spawn(async move {
        let (rx, tx) = tokio_io::split(server);
        transport::serve(rx, tx, &service).await
    });

    let len = (transport::MAX_FRAME_LEN as u32 + 1).to_be_bytes();
    client.write_all(&len).await?;

    let err = server_task.await?.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);

    // The server hung up without answering.
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await?;
    assert!(rest.is_empty());
    Ok(())
}
