use quadra::{ArrayError, ArrayHandle, BackendKind, Context, ContextConfig, DType, Dim4};

fn contexts() -> Result<Vec<Context>, ArrayError> {
    let _ = env_logger::builder().is_test(true).try_init();
    [
        BackendKind::Cpu,
        BackendKind::Parallel { threads: None },
        BackendKind::Parallel { threads: Some(2) },
    ]
    .into_iter()
    .map(|backend| {
        Context::new(ContextConfig {
            backend,
            ..Default::default()
        })
    })
    .collect()
}

fn seq(ctx: &Context, shape: Dim4) -> Result<ArrayHandle, ArrayError> {
    let data: Vec<i32> = (0..shape.elements() as i32).collect();
    ctx.create_array(shape, &data)
}

#[test]
fn identity_3x3() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let eye = ctx.identity(Dim4::from((3, 3)), DType::default())?;
        assert_eq!(ctx.dtype(&eye)?, DType::F32);
        let data = ctx.to_vec::<f32>(&eye)?;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(data[i * 3 + j], expected);
            }
        }
    }
    Ok(())
}

#[test]
fn range_along_the_first_axis() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let r = ctx.range(Dim4::from(4), -1, DType::F32)?;
        assert_eq!(ctx.to_vec::<f32>(&r)?, vec![0.0, 1.0, 2.0, 3.0]);
    }
    Ok(())
}

#[test]
fn join_two_vectors() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let a = ctx.create_array(Dim4::from(2), &[1.0f32, 2.0])?;
        let b = ctx.create_array(Dim4::from(2), &[3.0f32, 4.0])?;
        let c = ctx.join2(0, &a, &b)?;
        assert_eq!(ctx.to_vec::<f32>(&c)?, vec![1.0, 2.0, 3.0, 4.0]);

        let row = ctx.create_array(Dim4::from((1, 2)), &[1.0f32, 2.0])?;
        let tall = ctx.create_array(Dim4::from((2, 2)), &[1.0f32, 2.0, 3.0, 4.0])?;
        assert!(matches!(
            ctx.join2(1, &row, &tall),
            Err(ArrayError::DimensionMismatch { .. })
        ));
    }
    Ok(())
}

#[test]
fn join_then_split_reconstructs_inputs() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let a = seq(&ctx, Dim4::new([2, 3, 2, 1]))?;
        let b = ctx.constant(-1, Dim4::new([2, 1, 2, 1]), DType::S32)?;
        let c = ctx.join3(1, &a, &b, &a)?;
        assert_eq!(ctx.shape(&c)?, Dim4::new([2, 7, 2, 1]));

        // rotate the middle part to the front
        let rotated = ctx.shift(&c, &[0, -3])?;
        let data = ctx.to_vec::<i32>(&rotated)?;
        let a_data = ctx.to_vec::<i32>(&a)?;
        for i in 0..2 {
            for k in 0..2 {
                assert_eq!(data[i * 14 + k], -1);
                for j in 0..3 {
                    assert_eq!(data[i * 14 + (1 + j) * 2 + k], a_data[i * 6 + j * 2 + k]);
                }
            }
        }
    }
    Ok(())
}

#[test]
fn shift_by_one() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let a = ctx.create_array(Dim4::from(4), &[1i32, 2, 3, 4])?;
        let b = ctx.shift(&a, &[1])?;
        assert_eq!(ctx.to_vec::<i32>(&b)?, vec![4, 1, 2, 3]);
        assert_eq!(ctx.to_vec::<i32>(&a)?, vec![1, 2, 3, 4]);
    }
    Ok(())
}

#[test]
fn seeded_draws_repeat() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        ctx.set_seed(42);
        let a = ctx.randu(Dim4::from(1000), DType::F32)?;
        ctx.set_seed(42);
        let b = ctx.randu(Dim4::from(1000), DType::F32)?;
        assert_eq!(ctx.to_vec::<f32>(&a)?, ctx.to_vec::<f32>(&b)?);
        assert_eq!(ctx.get_seed(), 42);

        let c = ctx.randu(Dim4::from(1000), DType::F32)?;
        assert_ne!(ctx.to_vec::<f32>(&a)?, ctx.to_vec::<f32>(&c)?);
        assert_eq!(ctx.get_seed(), 42);
    }
    Ok(())
}

#[test]
fn backends_draw_the_same_stream() -> Result<(), ArrayError> {
    let mut results = Vec::new();
    for ctx in contexts()? {
        ctx.set_seed(7);
        let a = ctx.randn(Dim4::from((16, 16)), DType::C64)?;
        results.push(ctx.to_vec::<quadra::array::Complex64>(&a)?);
    }
    assert!(results.iter().all(|r| *r == results[0]));
    Ok(())
}

#[test]
fn lower_with_unit_diagonal() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let m = ctx.create_array(Dim4::from((2, 2)), &[1.0f64, 2.0, 3.0, 4.0])?;
        let l = ctx.lower(&m, true)?;
        assert_eq!(ctx.to_vec::<f64>(&l)?, vec![1.0, 0.0, 3.0, 1.0]);
        let u = ctx.upper(&m, false)?;
        assert_eq!(ctx.to_vec::<f64>(&u)?, vec![1.0, 2.0, 0.0, 4.0]);
    }
    Ok(())
}

#[test]
fn constant_has_shape_and_value() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let shape = Dim4::new([2, 3, 1, 2]);
        for dtype in DType::ALL {
            let a = ctx.constant(3.0, shape, dtype)?;
            assert_eq!(ctx.shape(&a)?, shape);
            assert_eq!(ctx.dtype(&a)?, dtype);
            assert_eq!(ctx.elements(&a)?, 12);
        }
        let a = ctx.constant(3.75, shape, DType::U8)?;
        assert_eq!(ctx.to_vec::<u8>(&a)?, vec![3; 12]);

        let big = ctx.constant_u64(u64::MAX - 1, shape)?;
        assert_eq!(ctx.to_vec::<u64>(&big)?, vec![u64::MAX - 1; 12]);
    }
    Ok(())
}

#[test]
fn moddims_round_trip() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let a = seq(&ctx, Dim4::new([2, 3, 4, 1]))?;
        let t = ctx.reorder(&a, &[2, 0, 1])?;
        let m = ctx.moddims(&t, Dim4::from((6, 4)))?;
        let back = ctx.moddims(&m, ctx.shape(&t)?)?;
        assert_eq!(ctx.to_vec::<i32>(&back)?, ctx.to_vec::<i32>(&t)?);

        let f = ctx.flat(&a)?;
        assert_eq!(ctx.shape(&f)?, Dim4::from(24));
        assert_eq!(ctx.to_vec::<i32>(&f)?, (0..24).collect::<Vec<_>>());
    }
    Ok(())
}

#[test]
fn flip_twice_is_identity() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let a = seq(&ctx, Dim4::new([2, 3, 2, 2]))?;
        for dim in 0..4 {
            let once = ctx.flip(&a, dim)?;
            let twice = ctx.flip(&once, dim)?;
            assert_eq!(ctx.to_vec::<i32>(&twice)?, ctx.to_vec::<i32>(&a)?);
        }
    }
    Ok(())
}

#[test]
fn tile_extents() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let a = seq(&ctx, Dim4::from((2, 3)))?;
        let same = ctx.tile(&a, Dim4::new([1, 1, 1, 1]))?;
        assert_eq!(ctx.to_vec::<i32>(&same)?, ctx.to_vec::<i32>(&a)?);

        let reps = Dim4::new([3, 1, 2, 2]);
        let t = ctx.tile(&a, reps)?;
        let shape = ctx.shape(&t)?;
        for k in 0..4 {
            assert_eq!(shape[k], ctx.shape(&a)?[k] * reps[k]);
        }
    }
    Ok(())
}

#[test]
fn diagonal_round_trip() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let v = ctx.create_array(Dim4::from(3), &[4u16, 5, 6])?;
        let m = ctx.diag(&v, 0, false)?;
        assert_eq!(ctx.shape(&m)?, Dim4::from((3, 3)));
        let back = ctx.diag(&m, 0, true)?;
        assert_eq!(ctx.to_vec::<u16>(&back)?, vec![4, 5, 6]);

        let sup = ctx.diag_create(&v, 2)?;
        assert_eq!(ctx.shape(&sup)?, Dim4::from((5, 5)));
        let again = ctx.diag_extract(&sup, 2)?;
        assert_eq!(ctx.to_vec::<u16>(&again)?, vec![4, 5, 6]);
    }
    Ok(())
}

#[test]
fn iota_grid() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let a = ctx.iota(Dim4::from((2, 2)), Dim4::from((2, 1)), DType::F32)?;
        assert_eq!(ctx.shape(&a)?, Dim4::from((4, 2)));
        assert_eq!(
            ctx.to_vec::<f32>(&a)?,
            vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0]
        );
    }
    Ok(())
}

#[test]
fn inputs_survive_transforms() -> Result<(), ArrayError> {
    for ctx in contexts()? {
        let a = seq(&ctx, Dim4::from((3, 3)))?;
        let before = ctx.to_vec::<i32>(&a)?;
        let outputs = [
            ctx.flip(&a, 0)?,
            ctx.reorder(&a, &[1, 0])?,
            ctx.flat(&a)?,
            ctx.upper(&a, true)?,
            ctx.copy(&a)?,
        ];
        ctx.release(a)?;
        for handle in outputs {
            assert_eq!(ctx.elements(&handle)?, before.len());
            ctx.release(handle)?;
        }
        assert_eq!(ctx.live_arrays(), 0);
    }
    Ok(())
}
