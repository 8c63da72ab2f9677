use {
    anyhow::Context as _,
    image::{GrayImage, ImageReader},
    std::path::Path,
};

/// A reference image of a button, kept in grayscale for matching.
#[derive(Debug, Clone)]
pub struct Template {
    image: GrayImage,
}

impl Template {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let reader =
            ImageReader::open(path).with_context(|| format!("failed to open image {:?}", path))?;
        let image = reader
            .with_guessed_format()
            .with_context(|| format!("failed to read image {:?}", path))?
            .decode()
            .with_context(|| format!("failed to decode image {:?}", path))?;
        Ok(Self {
            image: image.into_luma8(),
        })
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}

#[test]
fn load_missing_file_reports_path() {
    let err = Template::load("does/not/exist.png").unwrap_err();
    assert!(
        format!("{err:?}").contains("does/not/exist.png"),
        "unexpected error: {err:?}"
    );
}

#[test]
fn load_decodes_to_grayscale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("button.png");
    let mut rgba = image::RgbaImage::new(4, 3);
    rgba.put_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
    rgba.save(&path).unwrap();

    let template = Template::load(&path).unwrap();
    assert_eq!(template.image().dimensions(), (4, 3));
    assert_eq!(template.image().get_pixel(1, 1).0, [255]);
    assert_eq!(template.image().get_pixel(0, 0).0, [0]);
}
