mod image;

pub use image::{
    default_model_key, find_model, GeneratedImage, ImageGenerator, ImageModel,
    DEFAULT_IMAGE_MODEL_KEY, IMAGE_MODELS,
};
