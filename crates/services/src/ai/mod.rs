mod generator;

pub use generator::{
    DisabledGenerator, GENERATED_ID_BASE, GeneratorConfig, OpenAiQuestionGenerator,
    QuestionGenerator, category_for_topic,
};
