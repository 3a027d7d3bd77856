mod common;

use common::{
    frame_context, Event, Failure, RecordingDevice, COLOR_VIEW, DEPTH_VIEW, NORMAL_VIEW,
};
use mfs_core::math::Extent3D;
use mfs_core::renderer::{
    AddressMode, BindGroupEntry, BindingResource, FilterMode, FramebufferAttachment,
    FramebufferStatus, TextureDimension, TextureFormat, TextureId, TextureUsage, TextureViewId,
};
use mfs_core::stage::{Stage, StageError};
use mfs_stages::ports::{NormalTexture, PostprocessedFrame, Viewport};
use mfs_stages::ssao::{ResizeOutcome, RngSampleSource, SsaoResources};
use mfs_stages::{PostprocessingStage, SsaoSettings, StageState};
use std::path::PathBuf;

fn stage(settings: SsaoSettings) -> PostprocessingStage {
    PostprocessingStage::with_source(settings, Box::new(RngSampleSource::seeded(1234)))
}

fn is_render_target(e: &Event) -> bool {
    matches!(e, Event::CreateTexture { label, .. } if label == "ssao_render_target")
}

fn is_kernel(e: &Event) -> bool {
    matches!(e, Event::CreateTexture { label, .. } if label == "ssao_kernel")
}

fn is_noise(e: &Event) -> bool {
    matches!(e, Event::CreateTexture { label, .. } if label == "ssao_noise")
}

fn position(events: &[Event], pred: impl Fn(&Event) -> bool) -> usize {
    events.iter().position(pred).expect("event not recorded")
}

#[test]
fn test_first_frame_renders_into_viewport_sized_target() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 800, 600);
    let mut stage = stage(SsaoSettings::default());

    stage.on_initialize(&mut ctx).unwrap();
    assert_eq!(stage.state(), StageState::Ready);

    stage.process(&mut ctx).unwrap();
    assert_eq!(stage.state(), StageState::Processing);

    let targets = device.live_texture("ssao_render_target");
    assert_eq!(targets.len(), 1);
    let (_, target) = &targets[0];
    assert_eq!(target.size, Extent3D::d2(800, 600));
    assert_eq!(target.format, TextureFormat::Rgba32Float);

    let output = ctx.get::<PostprocessedFrame>().copied().unwrap();
    assert_eq!(Some(output.0), stage.resources().render_target_view());
}

#[test]
fn test_one_pass_and_one_draw_per_frame() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 800, 600);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();
    device.clear_events();

    stage.process(&mut ctx).unwrap();

    let events = device.events();
    let target = stage.resources().render_target_view().unwrap();
    assert_eq!(
        device.count(|e| matches!(e, Event::BeginPass { .. })),
        1
    );
    assert_eq!(device.count(|e| matches!(e, Event::EndPass)), 1);
    assert_eq!(device.count(|e| matches!(e, Event::Submit(_))), 1);
    assert_eq!(device.count(|e| matches!(e, Event::Draw { .. })), 1);
    assert!(events.contains(&Event::BeginPass {
        attachments: vec![target]
    }));
    assert!(events.contains(&Event::Draw {
        vertices: 0..3,
        instances: 0..1
    }));

    let kernel = position(&events, |e| matches!(e, Event::WriteTexture { .. }));
    let uniforms = position(&events, |e| matches!(e, Event::WriteBuffer { .. }));
    let begin = position(&events, |e| matches!(e, Event::BeginPass { .. }));
    let pipeline = position(&events, |e| matches!(e, Event::SetPipeline(_)));
    let bind = position(&events, |e| matches!(e, Event::SetBindGroup { index: 0, .. }));
    let draw = position(&events, |e| matches!(e, Event::Draw { .. }));
    let end = position(&events, |e| matches!(e, Event::EndPass));
    let submit = position(&events, |e| matches!(e, Event::Submit(_)));
    assert!(kernel < begin && uniforms < begin);
    assert!(begin < pipeline && pipeline < bind && bind < draw);
    assert!(draw < end && end < submit);
}

#[test]
fn test_bind_group_uses_fixed_units() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();
    stage.process(&mut ctx).unwrap();

    let entries = device
        .events()
        .into_iter()
        .find_map(|e| match e {
            Event::CreateBindGroup { entries, .. } => Some(entries),
            _ => None,
        })
        .unwrap();

    let kernel = stage.resources().kernel_view().unwrap();
    let noise = stage.resources().noise_view().unwrap();
    assert_eq!(entries.len(), 7);
    assert_eq!(entries[0], BindGroupEntry::texture_view(0, COLOR_VIEW));
    assert_eq!(entries[1], BindGroupEntry::texture_view(1, NORMAL_VIEW));
    assert_eq!(entries[2], BindGroupEntry::texture_view(2, DEPTH_VIEW));
    assert_eq!(entries[3], BindGroupEntry::texture_view(3, kernel));
    assert_eq!(entries[4], BindGroupEntry::texture_view(4, noise));
    assert!(matches!(entries[5].resource, BindingResource::Sampler(_)));
    assert!(matches!(entries[6].resource, BindingResource::Buffer(_)));

    if let BindingResource::Buffer(binding) = entries[6].resource {
        assert!(device.events().contains(&Event::WriteBuffer {
            id: binding.buffer,
            len: 208,
        }));
    }
}

#[test]
fn test_sampler_is_nearest_mirror_repeat() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();

    assert_eq!(
        device.count(|e| matches!(
            e,
            Event::CreateSampler {
                address_mode: AddressMode::MirrorRepeat,
                filter: FilterMode::Nearest,
                ..
            }
        )),
        1
    );
}

#[test]
fn test_noise_uploaded_once_at_initialization() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();

    let noise = stage.resources().noise_texture().unwrap();
    assert_eq!(device.count(is_noise), 1);
    assert!(device.events().contains(&Event::CreateTexture {
        id: noise,
        label: "ssao_noise".into(),
        size: Extent3D::d2(128, 128),
        format: TextureFormat::Rgba32Float,
        dimension: TextureDimension::D2,
    }));
    assert!(device.events().contains(&Event::WriteTexture {
        id: noise,
        len: 128 * 128 * 16,
        bytes_per_row: Some(128 * 16),
    }));

    for _ in 0..3 {
        stage.process(&mut ctx).unwrap();
        ctx.clear_changes();
    }
    assert_eq!(device.count(is_noise), 1);
    assert_eq!(stage.resources().noise_texture(), Some(noise));
}

#[test]
fn test_kernel_is_regenerated_every_frame() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();
    assert_eq!(device.count(is_kernel), 0);

    let mut kernels = Vec::new();
    for _ in 0..4 {
        stage.process(&mut ctx).unwrap();
        ctx.clear_changes();
        kernels.push(stage.resources().kernel_view().unwrap());
    }

    assert_eq!(device.count(is_kernel), 4);
    assert_eq!(device.live_texture("ssao_kernel").len(), 1);
    kernels.dedup();
    assert_eq!(kernels.len(), 4);
    assert!(device.events().iter().any(|e| matches!(
        e,
        Event::CreateTexture {
            label,
            size,
            dimension: TextureDimension::D1,
            ..
        } if label == "ssao_kernel" && *size == Extent3D::d1(16)
    )));
}

#[test]
fn test_viewport_change_reallocates_once_and_keeps_noise() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 800, 600);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();
    stage.process(&mut ctx).unwrap();
    ctx.clear_changes();

    let old_target = device.live_texture("ssao_render_target")[0].0;
    let noise = stage.resources().noise_texture().unwrap();
    device.clear_events();

    assert!(ctx.publish(Viewport::new(1024, 768)));
    stage.process(&mut ctx).unwrap();

    assert_eq!(device.count(is_render_target), 1);
    assert_eq!(device.count(is_noise), 0);
    assert!(device.events().contains(&Event::DestroyTexture(old_target)));
    assert!(!device.events().contains(&Event::DestroyTexture(noise)));
    assert!(!device
        .events()
        .iter()
        .any(|e| matches!(e, Event::WriteTexture { id, .. } if *id == noise)));

    let targets = device.live_texture("ssao_render_target");
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].1.size, Extent3D::d2(1024, 768));
    assert_eq!(
        ctx.get::<PostprocessedFrame>().map(|f| f.0),
        stage.resources().render_target_view()
    );
}

#[test]
fn test_unchanged_viewport_does_not_reallocate() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 320, 240);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();

    for _ in 0..3 {
        stage.process(&mut ctx).unwrap();
        ctx.clear_changes();
    }
    // Republishing the same size does not mark the viewport changed.
    assert!(!ctx.publish(Viewport::new(320, 240)));
    stage.process(&mut ctx).unwrap();

    assert_eq!(device.count(is_render_target), 1);
}

#[test]
fn test_target_allocated_lazily_without_viewport_at_init() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 640, 480);
    let viewport = ctx.remove::<Viewport>().unwrap();
    let mut stage = stage(SsaoSettings::default());

    stage.on_initialize(&mut ctx).unwrap();
    assert_eq!(device.count(is_render_target), 0);
    assert!(stage.resources().render_target_view().is_none());

    ctx.insert(viewport);
    stage.process(&mut ctx).unwrap();
    assert_eq!(device.count(is_render_target), 1);
}

#[test]
fn test_zero_kernel_size_rejected_before_gpu_work() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 800, 600);
    let mut stage = stage(SsaoSettings {
        kernel_size: 0,
        ..SsaoSettings::default()
    });

    let err = stage.on_initialize(&mut ctx).unwrap_err();
    assert!(matches!(err, StageError::InitializationFailed(_)));
    assert!(err.to_string().contains("kernel size"));
    assert!(device.events().is_empty());
    assert_eq!(stage.state(), StageState::Uninitialized);
}

#[test]
fn test_oversized_noise_rejected_before_gpu_work() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 800, 600);
    let mut stage = stage(SsaoSettings {
        noise_size: 100_000,
        ..SsaoSettings::default()
    });

    let err = stage.on_initialize(&mut ctx).unwrap_err();
    assert!(matches!(err, StageError::InitializationFailed(_)));
    assert!(err.to_string().contains("noise tile size"));
    assert!(device.events().is_empty());
    assert_eq!(stage.state(), StageState::Uninitialized);
}

#[test]
fn test_settings_in_context_take_precedence() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 64, 64);
    ctx.insert(SsaoSettings {
        kernel_size: 4,
        noise_size: 8,
        shader_path: None,
    });
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();
    stage.process(&mut ctx).unwrap();

    assert_eq!(stage.settings().kernel_size, 4);
    assert!(device.events().iter().any(|e| matches!(
        e,
        Event::CreateTexture { label, size, .. }
            if label == "ssao_kernel" && *size == Extent3D::d1(4)
    )));
    assert!(device.events().iter().any(|e| matches!(
        e,
        Event::CreateTexture { label, size, .. }
            if label == "ssao_noise" && *size == Extent3D::d2(8, 8)
    )));
}

#[test]
fn test_process_before_initialize_fails() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());

    assert!(matches!(
        stage.process(&mut ctx),
        Err(StageError::NotInitialized)
    ));
    assert!(device.events().is_empty());
}

#[test]
fn test_missing_input_fails_fast() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();
    device.clear_events();

    ctx.remove::<NormalTexture>();
    match stage.process(&mut ctx) {
        Err(StageError::InvalidContext { expected, .. }) => {
            assert!(expected.ends_with("NormalTexture"))
        }
        other => panic!("unexpected result: {:?}", other.err()),
    }
    assert_eq!(device.count(|e| matches!(e, Event::Draw { .. })), 0);
}

#[test]
fn test_missing_device_fails_initialization() {
    let mut ctx = mfs_core::stage::StageContext::new();
    let mut stage = stage(SsaoSettings::default());
    assert!(matches!(
        stage.on_initialize(&mut ctx),
        Err(StageError::InvalidContext { .. })
    ));
}

#[test]
fn test_unreadable_shader_path_fails_initialization() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings {
        shader_path: Some(PathBuf::from("no/such/postprocessing.wgsl")),
        ..SsaoSettings::default()
    });

    let err = stage.on_initialize(&mut ctx).unwrap_err();
    assert!(matches!(err, StageError::InitializationFailed(_)));
    assert!(err.to_string().contains("no/such/postprocessing.wgsl"));
    assert_eq!(device.count(|e| matches!(e, Event::CreateShader(_))), 0);
}

#[test]
fn test_shader_path_is_loaded() {
    let path = std::env::temp_dir().join(format!("mfs-postprocessing-{}.wgsl", std::process::id()));
    std::fs::write(&path, mfs_stages::shaders::POSTPROCESSING_WGSL).unwrap();

    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings {
        shader_path: Some(path.clone()),
        ..SsaoSettings::default()
    });
    let result = stage.on_initialize(&mut ctx);
    std::fs::remove_file(&path).ok();

    assert!(result.is_ok());
    assert_eq!(device.count(|e| matches!(e, Event::CreateShader(_))), 1);
}

#[test]
fn test_shader_compilation_failure_is_fatal() {
    let device = RecordingDevice::rejecting_shaders();
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());

    let err = stage.on_initialize(&mut ctx).unwrap_err();
    assert!(err.to_string().contains("rejected by test device"));
    assert_eq!(stage.state(), StageState::Uninitialized);
}

#[test]
fn test_pipeline_targets_float_format() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();

    assert!(device.events().iter().any(|e| matches!(
        e,
        Event::CreatePipeline { targets, .. } if targets == &[TextureFormat::Rgba32Float]
    )));
    assert_eq!(
        device.count(|e| matches!(e, Event::CreateBindGroupLayout { entries: 7, .. })),
        1
    );
}

#[test]
fn test_shutdown_releases_everything() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 800, 600);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();
    stage.process(&mut ctx).unwrap();
    stage.process(&mut ctx).unwrap();

    stage.on_shutdown(&mut ctx);

    assert!(device.live_textures().is_empty());
    assert_eq!(stage.state(), StageState::Uninitialized);
    assert!(!ctx.contains::<PostprocessedFrame>());
    assert_eq!(device.count(|e| matches!(e, Event::DestroyBindGroup(_))), 2);
    for what in ["shader", "pipeline", "pipeline_layout", "bind_group_layout", "buffer", "sampler"] {
        assert_eq!(device.count(|e| *e == Event::Destroy(what)), 1, "{}", what);
    }

    assert!(matches!(
        stage.process(&mut ctx),
        Err(StageError::NotInitialized)
    ));
}

#[test]
fn test_rejected_pipeline_fails_initialization_and_releases_partial_objects() {
    let device = RecordingDevice::failing(Failure::Pipeline);
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());

    let err = stage.on_initialize(&mut ctx).unwrap_err();
    assert!(matches!(err, StageError::InitializationFailed(_)));
    assert!(err.to_string().contains("render pipeline rejected"));
    assert_eq!(stage.state(), StageState::Uninitialized);

    for what in ["shader", "pipeline_layout", "bind_group_layout"] {
        assert_eq!(device.count(|e| *e == Event::Destroy(what)), 1, "{}", what);
    }
    assert_eq!(device.count(|e| matches!(e, Event::CreateTexture { .. })), 0);
    assert!(matches!(
        stage.process(&mut ctx),
        Err(StageError::NotInitialized)
    ));
}

#[test]
fn test_rejected_bind_group_fails_the_frame() {
    let device = RecordingDevice::failing(Failure::BindGroup);
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();

    let err = stage.process(&mut ctx).unwrap_err();
    assert!(matches!(err, StageError::ExecutionFailed(_)));
    assert!(err.to_string().contains("bind group rejected"));
    assert_eq!(device.count(|e| matches!(e, Event::Draw { .. })), 0);
    assert!(!ctx.contains::<PostprocessedFrame>());
    assert_eq!(stage.state(), StageState::Ready);
}

#[test]
fn test_rejected_submission_fails_the_frame() {
    let device = RecordingDevice::failing(Failure::Submit);
    let mut ctx = frame_context(&device, 64, 64);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();

    let err = stage.process(&mut ctx).unwrap_err();
    assert!(matches!(err, StageError::ExecutionFailed(_)));
    assert_eq!(device.count(|e| matches!(e, Event::Submit(_))), 0);
    assert!(!ctx.contains::<PostprocessedFrame>());
    assert_eq!(stage.state(), StageState::Ready);

    stage.on_shutdown(&mut ctx);
    assert!(device.live_textures().is_empty());
}

fn extra_output(width: u32, height: u32) -> FramebufferAttachment {
    FramebufferAttachment {
        texture: TextureId(7001),
        view: TextureViewId(7002),
        format: TextureFormat::Rgba32Float,
        size: Extent3D::d2(width, height),
        usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
    }
}

#[test]
fn test_reallocation_reports_mismatched_extra_attachment() {
    let device = RecordingDevice::new();
    let mut resources = SsaoResources::new();
    resources.framebuffer_mut().attach_color(1, extra_output(4, 4));

    let outcome = resources.ensure_render_target(&device, 64, 64).unwrap();

    assert_eq!(
        outcome,
        ResizeOutcome::Reallocated(FramebufferStatus::SizeMismatch {
            slot: 1,
            expected: Extent3D::d2(64, 64),
            found: Extent3D::d2(4, 4),
        })
    );
    resources.destroy(&device);
    assert!(device.live_textures().is_empty());
    assert!(resources.framebuffer().color_attachment(1).is_some());
}

#[test]
fn test_incomplete_framebuffer_still_renders_the_frame() {
    let device = RecordingDevice::new();
    let mut ctx = frame_context(&device, 800, 600);
    let mut stage = stage(SsaoSettings::default());
    stage.on_initialize(&mut ctx).unwrap();
    stage
        .resources_mut()
        .framebuffer_mut()
        .attach_color(1, extra_output(800, 600));
    stage.process(&mut ctx).unwrap();
    ctx.clear_changes();
    device.clear_events();

    assert!(ctx.publish(Viewport::new(1024, 768)));
    stage.process(&mut ctx).unwrap();

    assert!(!stage.resources().framebuffer().check_status().is_complete());
    assert_eq!(device.count(is_render_target), 1);
    assert_eq!(device.count(|e| matches!(e, Event::Draw { .. })), 1);
    assert_eq!(device.count(|e| matches!(e, Event::Submit(_))), 1);
    let target = stage.resources().render_target_view().unwrap();
    assert!(device.events().contains(&Event::BeginPass {
        attachments: vec![target, TextureViewId(7002)]
    }));
    assert_eq!(ctx.get::<PostprocessedFrame>().map(|f| f.0), Some(target));
    assert_eq!(stage.state(), StageState::Processing);
}
