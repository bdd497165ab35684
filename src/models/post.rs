use rand::Rng;
use serde::{Deserialize, Serialize};

/// Post entity: a titled piece of content with four associated images.
/// `image_url1..4` hold generated filenames inside the upload directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub image_url1: String,
    pub image_url2: String,
    pub image_url3: String,
    pub image_url4: String,
}

impl Post {
    /// All four stored image filenames, in slot order.
    pub fn image_urls(&self) -> [&str; 4] {
        [
            &self.image_url1,
            &self.image_url2,
            &self.image_url3,
            &self.image_url4,
        ]
    }

    /// Pick two of the four images uniformly at random, without replacement.
    pub fn random_image_pair(&self) -> [&str; 2] {
        let images = self.image_urls();
        let indexes = random_indexes(2, images.len());
        [images[indexes[0]], images[indexes[1]]]
    }
}

/// Draw `count` distinct indexes in `[0, len)` by rejection sampling:
/// keep drawing uniformly and discard values already chosen. For the
/// 2-out-of-4 case this needs ~2.67 draws on average.
pub fn random_indexes(count: usize, len: usize) -> Vec<usize> {
    assert!(count <= len, "cannot draw {} distinct values out of {}", count, len);

    let mut rng = rand::thread_rng();
    let mut indexes = Vec::with_capacity(count);

    while indexes.len() < count {
        let index = rng.gen_range(0..len);
        if !indexes.contains(&index) {
            indexes.push(index);
        }
    }

    indexes
}

/// One of the four image slots of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    First,
    Second,
    Third,
    Fourth,
}

impl ImageSlot {
    /// Parse the 1-based slot number submitted by the edit form.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self::First),
            "2" => Some(Self::Second),
            "3" => Some(Self::Third),
            "4" => Some(Self::Fourth),
            _ => None,
        }
    }

    /// Column the slot maps to. Always one of four fixed names; user input
    /// never reaches the SQL text of a slot-addressed UPDATE.
    pub fn column(&self) -> &'static str {
        match self {
            Self::First => "image_url1",
            Self::Second => "image_url2",
            Self::Third => "image_url3",
            Self::Fourth => "image_url4",
        }
    }
}

/// Request structure for creating a new post, assembled from the
/// multipart form by the create handler.
#[derive(Debug)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    /// Generated filenames of the uploaded images, in submission order.
    pub image_urls: Vec<String>,
}

impl CreatePostRequest {
    /// Validate the create post request
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title cannot be empty".to_string());
        }

        if self.content.trim().is_empty() {
            return Err("Content cannot be empty".to_string());
        }

        if self.image_urls.len() != 4 {
            return Err(format!(
                "Exactly 4 images are required, got {}",
                self.image_urls.len()
            ));
        }

        Ok(())
    }
}

/// A replacement image for a single, explicitly named slot.
#[derive(Debug)]
pub struct ImageReplacement {
    pub slot: ImageSlot,
    pub filename: String,
}

/// Request structure for updating an existing post. Title and content are
/// always rewritten; at most one image slot is overwritten per call, and
/// the caller has to say which one.
#[derive(Debug)]
pub struct UpdatePostRequest {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub image: Option<ImageReplacement>,
}

impl UpdatePostRequest {
    /// Validate the update post request
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title cannot be empty".to_string());
        }

        if self.content.trim().is_empty() {
            return Err("Content cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post {
            id: 1,
            title: "Test Title".to_string(),
            content: "Test content".to_string(),
            image_url1: "a.png".to_string(),
            image_url2: "b.png".to_string(),
            image_url3: "c.png".to_string(),
            image_url4: "d.png".to_string(),
        }
    }

    #[test]
    fn test_image_urls_order() {
        let post = sample_post();
        assert_eq!(post.image_urls(), ["a.png", "b.png", "c.png", "d.png"]);
    }

    #[test]
    fn test_random_image_pair_is_distinct_and_stored() {
        let post = sample_post();
        let stored = post.image_urls();

        for _ in 0..200 {
            let [first, second] = post.random_image_pair();
            assert_ne!(first, second);
            assert!(stored.contains(&first));
            assert!(stored.contains(&second));
        }
    }

    #[test]
    fn test_random_indexes_distinct_and_in_range() {
        for _ in 0..200 {
            let indexes = random_indexes(2, 4);
            assert_eq!(indexes.len(), 2);
            assert_ne!(indexes[0], indexes[1]);
            assert!(indexes.iter().all(|&i| i < 4));
        }
    }

    #[test]
    fn test_random_indexes_full_population() {
        let mut indexes = random_indexes(4, 4);
        indexes.sort_unstable();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_image_slot_parsing() {
        assert_eq!(ImageSlot::parse("1"), Some(ImageSlot::First));
        assert_eq!(ImageSlot::parse(" 4 "), Some(ImageSlot::Fourth));
        assert_eq!(ImageSlot::parse("0"), None);
        assert_eq!(ImageSlot::parse("5"), None);
        assert_eq!(ImageSlot::parse("first"), None);
    }

    #[test]
    fn test_image_slot_columns() {
        assert_eq!(ImageSlot::First.column(), "image_url1");
        assert_eq!(ImageSlot::Second.column(), "image_url2");
        assert_eq!(ImageSlot::Third.column(), "image_url3");
        assert_eq!(ImageSlot::Fourth.column(), "image_url4");
    }

    fn valid_create_request() -> CreatePostRequest {
        CreatePostRequest {
            title: "Test Title".to_string(),
            content: "Test content".to_string(),
            image_urls: vec![
                "1-1.png".to_string(),
                "2-2.png".to_string(),
                "3-3.png".to_string(),
                "4-4.png".to_string(),
            ],
        }
    }

    #[test]
    fn test_create_post_request_validation() {
        assert!(valid_create_request().validate().is_ok());

        // Empty title
        let mut request = valid_create_request();
        request.title = "  ".to_string();
        assert!(request.validate().is_err());

        // Empty content
        let mut request = valid_create_request();
        request.content = String::new();
        assert!(request.validate().is_err());

        // Fewer than 4 images
        let mut request = valid_create_request();
        request.image_urls.pop();
        assert!(request.validate().is_err());

        // More than 4 images
        let mut request = valid_create_request();
        request.image_urls.push("5-5.png".to_string());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_post_request_validation() {
        let valid = UpdatePostRequest {
            id: 1,
            title: "Updated Title".to_string(),
            content: "Updated content".to_string(),
            image: None,
        };
        assert!(valid.validate().is_ok());

        let with_image = UpdatePostRequest {
            id: 1,
            title: "Updated Title".to_string(),
            content: "Updated content".to_string(),
            image: Some(ImageReplacement {
                slot: ImageSlot::Third,
                filename: "99-99.png".to_string(),
            }),
        };
        assert!(with_image.validate().is_ok());

        let missing_title = UpdatePostRequest {
            id: 1,
            title: String::new(),
            content: "Updated content".to_string(),
            image: None,
        };
        assert!(missing_title.validate().is_err());
    }
}
