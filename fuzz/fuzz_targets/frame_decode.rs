#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use ws_session_core::decoder::FrameDecoder;
use ws_session_core::SessionConfig;

/// Feeds the same bytes through the decoder twice: once in one shot, once
/// one byte at a time. Both runs must agree on every frame they decode,
/// and neither run may ever panic regardless of how malformed `data` is.
fuzz_target!(|data: &[u8]| {
    let config = SessionConfig::default();

    let one_shot = {
        let mut buf = BytesMut::from(data);
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        loop {
            match decoder.decode(&mut buf, &config) {
                Ok(Some(frame)) => frames.push((frame.fin, frame.opcode, frame.payload)),
                Ok(None) => break,
                Err(_) => break,
            }
        }
        frames
    };

    let incremental = {
        let mut buf = BytesMut::new();
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for byte in data {
            buf.extend_from_slice(&[*byte]);
            while let Ok(Some(frame)) = decoder.decode(&mut buf, &config) {
                frames.push((frame.fin, frame.opcode, frame.payload));
            }
        }
        frames
    };

    let n = one_shot.len().min(incremental.len());
    for i in 0..n {
        assert_eq!(one_shot[i].0, incremental[i].0);
        assert_eq!(one_shot[i].1, incremental[i].1);
        assert_eq!(one_shot[i].2, incremental[i].2);
    }
});
