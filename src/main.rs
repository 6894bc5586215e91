//! Hermes Archive - Latency Report
//!
//! Pengukuran cepat tanpa criterion untuk tiap lapisan codec:
//! - Fixed-width integer
//! - Varint length prefix
//! - Bulk byte copy (string / Vec<u8>)
//! - Composite (Frame) lewat streaming buffer

use std::hint::black_box;
use std::time::Instant;

use anyhow::Result;
use hermes_archive::network::Frame;
use hermes_archive::{Archive, MmapBuffer, VecBuffer};

fn main() -> Result<()> {
    println!("🚀 Hermes Archive - Codec Report v0.1");
    println!("=====================================\n");

    benchmark_fixed()?;
    benchmark_varint()?;
    benchmark_bulk()?;
    benchmark_composite()?;
    benchmark_mmap()?;

    println!("\n✅ All benchmarks complete!");
    println!("\nTo start echo server: cargo run --release --bin archive_echo -- --bind 0.0.0.0:9999");

    Ok(())
}

fn report(label: &str, iterations: usize, elapsed_ns: f64) {
    let per_op = elapsed_ns / iterations as f64;
    println!(
        "  {:<16} {:.2} ns/op ({:.3} μs/op)",
        label,
        per_op,
        per_op / 1000.0
    );
}

fn benchmark_fixed() -> Result<()> {
    println!("📊 Fixed-Width Benchmark (u64 little-endian)");
    println!("--------------------------------------------");

    const ITERATIONS: usize = 1_000_000;
    let mut buffer = VecBuffer::new();

    let start = Instant::now();
    {
        let mut archive = Archive::new(&mut buffer);
        for i in 0..ITERATIONS {
            archive.encode(&black_box(i as u64))?;
        }
    }
    let encode_duration = start.elapsed();

    let start = Instant::now();
    {
        let mut archive = Archive::new(&mut buffer);
        for _ in 0..ITERATIONS {
            black_box(archive.decode::<u64>()?);
        }
    }
    let decode_duration = start.elapsed();

    println!("  Operations: {}", ITERATIONS);
    report("Encode latency:", ITERATIONS, encode_duration.as_nanos() as f64);
    report("Decode latency:", ITERATIONS, decode_duration.as_nanos() as f64);
    println!(
        "  Throughput:      {:.2} M ops/sec\n",
        ITERATIONS as f64 / encode_duration.as_secs_f64() / 1_000_000.0
    );

    Ok(())
}

fn benchmark_varint() -> Result<()> {
    println!("📊 Varint Benchmark (LEB128 lengths)");
    println!("------------------------------------");

    const ITERATIONS: usize = 1_000_000;
    let mut buffer = VecBuffer::new();

    let start = Instant::now();
    {
        let mut archive = Archive::new(&mut buffer);
        for i in 0..ITERATIONS {
            // Campuran 1, 2, dan 3 byte
            archive.write_varint(black_box((i as u64 * 7919) % 2_000_000))?;
        }
    }
    let encode_duration = start.elapsed();
    let encoded_size = buffer.len();

    let start = Instant::now();
    {
        let mut archive = Archive::new(&mut buffer);
        for _ in 0..ITERATIONS {
            black_box(archive.read_varint()?);
        }
    }
    let decode_duration = start.elapsed();

    println!("  Operations: {}", ITERATIONS);
    println!(
        "  Avg size:   {:.2} bytes",
        encoded_size as f64 / ITERATIONS as f64
    );
    report("Encode latency:", ITERATIONS, encode_duration.as_nanos() as f64);
    report("Decode latency:", ITERATIONS, decode_duration.as_nanos() as f64);
    println!();

    Ok(())
}

fn benchmark_bulk() -> Result<()> {
    println!("📊 Bulk Copy Benchmark (Vec<u8> payload)");
    println!("----------------------------------------");

    const ITERATIONS: usize = 100_000;
    const PAYLOAD_SIZE: usize = 1024;

    let payload = vec![0xA5u8; PAYLOAD_SIZE];
    let mut buffer = VecBuffer::new();

    let start = Instant::now();
    {
        let mut archive = Archive::new(&mut buffer);
        for _ in 0..ITERATIONS {
            archive.encode(black_box(&payload))?;
        }
    }
    let encode_duration = start.elapsed();

    let start = Instant::now();
    {
        let mut archive = Archive::new(&mut buffer);
        for _ in 0..ITERATIONS {
            black_box(archive.decode::<Vec<u8>>()?);
        }
    }
    let decode_duration = start.elapsed();

    println!("  Payload size: {} bytes", PAYLOAD_SIZE);
    report("Encode latency:", ITERATIONS, encode_duration.as_nanos() as f64);
    report("Decode latency:", ITERATIONS, decode_duration.as_nanos() as f64);
    println!(
        "  Encode throughput: {:.2} MB/sec\n",
        (ITERATIONS * PAYLOAD_SIZE) as f64 / encode_duration.as_secs_f64() / 1_000_000.0
    );

    Ok(())
}

fn benchmark_composite() -> Result<()> {
    println!("📊 Composite Benchmark (Frame streaming)");
    println!("----------------------------------------");

    const ITERATIONS: usize = 1_000_000;
    const BATCH: usize = 1000;

    let frame = Frame::new(0, vec![0u8; 64]);
    let mut buffer = VecBuffer::new();

    // Encode satu batch, lalu decode habis: pola produce/consume streaming
    let start = Instant::now();
    for _ in 0..ITERATIONS / BATCH {
        {
            let mut archive = Archive::new(&mut buffer);
            for _ in 0..BATCH {
                archive.encode(black_box(&frame))?;
            }
        }
        let mut archive = Archive::new(&mut buffer);
        for _ in 0..BATCH {
            black_box(archive.decode::<Frame>()?);
        }
    }
    let duration = start.elapsed();

    println!("  Frame size: {} bytes", frame.encoded_len());
    report("Round trip:", ITERATIONS, duration.as_nanos() as f64);
    println!(
        "  Throughput:  {:.2} M frames/sec\n",
        ITERATIONS as f64 / duration.as_secs_f64() / 1_000_000.0
    );

    Ok(())
}

fn benchmark_mmap() -> Result<()> {
    println!("📊 Mmap Buffer Benchmark (file-backed archive)");
    println!("----------------------------------------------");

    const ITERATIONS: usize = 100_000;

    let path = std::env::temp_dir().join("hermes_archive_bench.dat");
    let frame = Frame::new(0, vec![0u8; 64]);

    // Sisa run sebelumnya akan di-restore oleh header, mulai dari file bersih
    std::fs::remove_file(&path).ok();

    let duration = {
        let mut buffer = MmapBuffer::open(&path, 16 * 1024 * 1024)?;
        let start = Instant::now();
        {
            let mut archive = Archive::new(&mut buffer);
            for _ in 0..ITERATIONS {
                archive.encode(black_box(&frame))?;
            }
        }
        let duration = start.elapsed();
        buffer.flush()?;
        duration
    };

    report("Encode latency:", ITERATIONS, duration.as_nanos() as f64);
    println!(
        "  Write throughput: {:.2} MB/sec",
        (ITERATIONS * frame.encoded_len()) as f64 / duration.as_secs_f64() / 1_000_000.0
    );

    std::fs::remove_file(&path).ok();
    Ok(())
}
