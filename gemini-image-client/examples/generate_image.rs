use gemini_image_client::{Client, GenerateImageRequest, InputImage};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let prompt = args
        .next()
        .unwrap_or_else(|| "Dress the model in the garment from the second image".to_string());

    let mut request = GenerateImageRequest::new(prompt);
    for path in args {
        request = request.image(InputImage::from_bytes(std::fs::read(&path)?));
    }
    if let Ok(model) = std::env::var("GEMINI_EXAMPLE_MODEL") {
        request = request.model(model);
    }

    // gemini_config.json / gemini_api_key.txt are looked up in the working directory.
    let client = Client::from_plugin_dir(std::env::current_dir()?)?;
    match client.generate_image(request).await {
        Ok(bytes) => {
            let output = std::env::var("GEMINI_EXAMPLE_OUTPUT")
                .map_or_else(|_| PathBuf::from("gemini_output.png"), PathBuf::from);
            std::fs::write(&output, bytes)?;
            println!("saved {}", output.display());
        }
        Err(err) if err.is_content_blocked() => eprintln!("blocked, revise the prompt: {err}"),
        Err(err) => eprintln!("request failed: {err}"),
    }
    Ok(())
}
