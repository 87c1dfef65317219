use serde::Deserialize;

/// Entry in a collection listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ThingSummary {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// Full thing detail.
#[derive(Debug, Clone, Deserialize)]
pub struct Thing {
    pub id: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub default_image: Option<ImageDescriptor>,
}

/// A preview image with its available renditions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageDescriptor {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sizes: Vec<ImageVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageVariant {
    #[serde(rename = "type")]
    pub kind: String,
    pub size: String,
    pub url: String,
}

impl ImageDescriptor {
    /// The rendition used as the canonical preview.
    pub fn display_large(&self) -> Option<&ImageVariant> {
        self.sizes
            .iter()
            .find(|v| v.kind == "display" && v.size == "large")
    }
}

/// A file attached to a thing.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDescriptor {
    pub id: u64,
    pub name: String,
    pub download_url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_thing_with_nulls() {
        let thing: Thing = serde_json::from_value(json!({
            "id": 42,
            "name": "Bracket",
            "description": null,
            "public_url": null,
            "default_image": null,
            "like_count": 7
        }))
        .unwrap();
        assert_eq!(thing.id, 42);
        assert!(thing.description.is_none());
        assert!(thing.public_url.is_none());
        assert!(thing.default_image.is_none());
    }

    #[test]
    fn test_display_large_selection() {
        let image: ImageDescriptor = serde_json::from_value(json!({
            "id": 1,
            "name": "render.jpg",
            "sizes": [
                {"type": "thumb", "size": "large", "url": "https://cdn.test/t.jpg"},
                {"type": "display", "size": "medium", "url": "https://cdn.test/m.jpg"},
                {"type": "display", "size": "large", "url": "https://cdn.test/l.jpg"}
            ]
        }))
        .unwrap();
        assert_eq!(image.display_large().unwrap().url, "https://cdn.test/l.jpg");
    }

    #[test]
    fn test_display_large_missing() {
        let image: ImageDescriptor = serde_json::from_value(json!({})).unwrap();
        assert!(image.display_large().is_none());
    }
}
