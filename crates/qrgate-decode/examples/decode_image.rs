use image::ImageReader;
use qrgate_core::{classify, init_with_level, DecodeOptions, Decoder, ScannerConfig};
use qrgate_decode::QrDecoder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(log::LevelFilter::Info)?;

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("Usage: decode_image <image_path> [config.json]");
        return Ok(());
    };
    let config = match args.next() {
        Some(config) => ScannerConfig::load_json(config)?,
        None => ScannerConfig::default(),
    };

    let img = ImageReader::open(path)?.decode()?.to_rgba8();
    let options: DecodeOptions = config.decode_options();
    let mut decoder = QrDecoder::new();
    let decoded = decoder.decode(img.as_raw(), img.width(), img.height(), &options)?;

    match decoded {
        Some(found) => println!("{:?}", classify(&found.payload, config.url_policy)),
        None => println!("no QR code found"),
    }

    Ok(())
}
